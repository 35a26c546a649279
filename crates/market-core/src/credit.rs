//! Credit rating scale and structured-products balance tables.

use serde::{Deserialize, Serialize};

/// Seven-notch credit rating for the structured products desk.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum CreditRating {
    F,
    D,
    C,
    B,
    A,
    Aa,
    Aaa,
}

impl CreditRating {
    /// The full scale, worst to best.
    pub const SCALE: [CreditRating; 7] = [
        CreditRating::F,
        CreditRating::D,
        CreditRating::C,
        CreditRating::B,
        CreditRating::A,
        CreditRating::Aa,
        CreditRating::Aaa,
    ];

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            CreditRating::F => "F",
            CreditRating::D => "D",
            CreditRating::C => "C",
            CreditRating::B => "B",
            CreditRating::A => "A",
            CreditRating::Aa => "AA",
            CreditRating::Aaa => "AAA",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    /// DAS yield multiplier at this rating.
    pub fn yield_multiplier(self) -> f64 {
        [0.5, 0.7, 1.0, 1.2, 1.4, 1.6, 1.8][self.index()]
    }

    /// Borrow capacity as a fraction of portfolio value.
    pub fn leverage_ratio(self) -> f64 {
        [0.2, 0.35, 0.5, 0.7, 0.9, 1.1, 1.5][self.index()]
    }

    /// Interest accrued on outstanding debt per tick.
    pub fn interest_rate(self) -> f64 {
        [0.0015, 0.0012, 0.001, 0.0007, 0.0004, 0.0002, 0.0001][self.index()]
    }

    /// One notch worse; saturates at F.
    pub fn downgraded(self) -> CreditRating {
        Self::SCALE[self.index().saturating_sub(1)]
    }

    /// One notch better; saturates at AAA.
    pub fn upgraded(self) -> CreditRating {
        Self::SCALE[(self.index() + 1).min(Self::SCALE.len() - 1)]
    }
}

/// Rating a fresh desk opens at.
pub const STARTING_RATING: CreditRating = CreditRating::C;

/// Base yield per unit of locked collateral value per tick.
pub const DAS_BASE_YIELD: f64 = 0.002;

/// Minimum quantity that can be securitized into one DAS.
pub const DAS_MIN_QUANTITY: f64 = 10.0;

/// Maximum concurrent DAS positions.
pub const DAS_MAX_POSITIONS: usize = 8;

/// A DAS defaults when price falls below `securitization price x threshold`.
pub const DAS_DEFAULT_THRESHOLD: f64 = 0.5;

/// Yield decay per additional concurrent position in the same commodity.
pub const DAS_SAME_COMMODITY_DECAY: f64 = 0.75;

/// Margin call fires when `debt / portfolio value` exceeds this.
pub const MARGIN_CALL_THRESHOLD: f64 = 0.85;

/// Ticks between credit rating reviews.
pub const RATING_REVIEW_INTERVAL: u32 = 50;

/// Debt ratio above which a review counts toward a downgrade.
pub const RATING_DEGRADE_RATIO: f64 = 0.7;

/// Consecutive high-debt reviews required for a downgrade.
pub const RATING_DEGRADE_REVIEWS: u32 = 2;

/// Debt ratio below which a review can upgrade.
pub const RATING_IMPROVE_RATIO: f64 = 0.3;

/// Ticks without a default required for an upgrade.
pub const RATING_NO_DEFAULT_WINDOW: u64 = 200;

/// Distinct commodities required across the book for an upgrade.
pub const RATING_DIVERSIFICATION_MIN: usize = 3;
