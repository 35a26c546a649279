//! Structured products desk: DAS book, leverage, and the credit rating
//! state machine.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use market_core::credit::{
    DAS_BASE_YIELD, DAS_DEFAULT_THRESHOLD, DAS_MAX_POSITIONS, DAS_MIN_QUANTITY,
    DAS_SAME_COMMODITY_DECAY, MARGIN_CALL_THRESHOLD, RATING_DEGRADE_RATIO,
    RATING_DEGRADE_REVIEWS, RATING_DIVERSIFICATION_MIN, RATING_IMPROVE_RATIO,
    RATING_NO_DEFAULT_WINDOW, RATING_REVIEW_INTERVAL, STARTING_RATING,
};
use market_core::{CommodityId, CreditRating};

/// A digital asset security: locked collateral paying a per-tick coupon.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DigitalAssetSecurity {
    /// Stable id within one engine.
    pub id: u32,
    /// Collateral commodity.
    pub commodity: CommodityId,
    /// Locked units.
    pub quantity: f64,
    /// Spot price at securitization; the default trigger references it.
    pub securitization_price: f64,
    /// Tick the position was created.
    pub created_tick: u64,
    /// Cost basis carried out of the holding, restored on unwind.
    pub cost_basis: f64,
    /// Purchased units carried out of the holding, restored on unwind.
    pub purchased_quantity: f64,
}

/// What one desk tick did; the engine turns this into cash and events.
#[derive(Debug, Default)]
pub struct DeskTickOutcome {
    /// Coupon income to credit.
    pub income: f64,
    /// Positions that defaulted this tick (collateral forfeited).
    pub defaults: Vec<(u32, CommodityId)>,
    /// Position force-liquidated by a margin call, if any.
    pub margin_liquidated: Option<u32>,
    /// New rating when it moved this tick.
    pub rating_change: Option<CreditRating>,
    /// Whether debt moved (interest, margin proceeds).
    pub debt_changed: bool,
}

/// The desk's book, debt, and rating history.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Desk {
    securities: Vec<DigitalAssetSecurity>,
    debt: f64,
    interest_paid: f64,
    rating: CreditRating,
    ticks_since_review: u32,
    high_debt_reviews: u32,
    last_default_tick: Option<u64>,
    next_das_id: u32,
}

impl Default for Desk {
    fn default() -> Self {
        Desk::new()
    }
}

impl Desk {
    /// A fresh desk: empty book, no debt, starting rating C.
    pub fn new() -> Self {
        Desk {
            securities: Vec::new(),
            debt: 0.0,
            interest_paid: 0.0,
            rating: STARTING_RATING,
            ticks_since_review: 0,
            high_debt_reviews: 0,
            last_default_tick: None,
            next_das_id: 1,
        }
    }

    /// Open positions.
    pub fn securities(&self) -> &[DigitalAssetSecurity] {
        &self.securities
    }

    /// Outstanding debt.
    pub fn debt(&self) -> f64 {
        self.debt
    }

    /// Lifetime interest accrued.
    pub fn interest_paid(&self) -> f64 {
        self.interest_paid
    }

    /// Current credit rating.
    pub fn rating(&self) -> CreditRating {
        self.rating
    }

    /// Mark-to-market value of the book.
    pub fn portfolio_value(&self, price_of: impl Fn(CommodityId) -> f64) -> f64 {
        self.securities
            .iter()
            .map(|das| das.quantity * price_of(das.commodity))
            .sum()
    }

    /// Remaining borrow headroom at the current rating.
    pub fn borrow_capacity(&self, price_of: impl Fn(CommodityId) -> f64) -> f64 {
        (self.portfolio_value(&price_of) * self.rating.leverage_ratio() - self.debt).max(0.0)
    }

    /// Coupon income the book pays per tick at current prices, with the
    /// rating multiplier and same-commodity decay applied.
    pub fn yield_per_tick(
        &self,
        price_of: impl Fn(CommodityId) -> f64,
        das_yield_bonus: f64,
    ) -> f64 {
        self.securities
            .iter()
            .enumerate()
            .map(|(i, das)| {
                let same_commodity_others = self
                    .securities
                    .iter()
                    .enumerate()
                    .filter(|(j, other)| *j != i && other.commodity == das.commodity)
                    .count();
                DAS_BASE_YIELD
                    * das.quantity
                    * price_of(das.commodity)
                    * self.rating.yield_multiplier()
                    * DAS_SAME_COMMODITY_DECAY.powi(same_commodity_others as i32)
                    * (1.0 + das_yield_bonus)
            })
            .sum()
    }

    /// Interest that will accrue onto the debt next tick.
    pub fn interest_per_tick(&self) -> f64 {
        if self.debt > 0.0 {
            self.debt * self.rating.interest_rate()
        } else {
            0.0
        }
    }

    /// Create a position from locked collateral. Rejects undersized lots
    /// and a full book. Returns the new position's id.
    #[allow(clippy::too_many_arguments)]
    pub fn securitize(
        &mut self,
        commodity: CommodityId,
        quantity: f64,
        price: f64,
        cost_basis: f64,
        purchased_quantity: f64,
        tick: u64,
    ) -> Option<u32> {
        if quantity < DAS_MIN_QUANTITY || self.securities.len() >= DAS_MAX_POSITIONS {
            return None;
        }
        let id = self.next_das_id;
        self.next_das_id += 1;
        self.securities.push(DigitalAssetSecurity {
            id,
            commodity,
            quantity,
            securitization_price: price,
            created_tick: tick,
            cost_basis,
            purchased_quantity,
        });
        info!(id, ?commodity, quantity, price, "securitized");
        Some(id)
    }

    /// Close a position voluntarily; the caller restores the collateral.
    pub fn unwind(&mut self, id: u32) -> Option<DigitalAssetSecurity> {
        let idx = self.securities.iter().position(|das| das.id == id)?;
        Some(self.securities.remove(idx))
    }

    /// One desk tick: defaults, coupons, interest, margin check, and the
    /// periodic rating review.
    pub fn process_tick(
        &mut self,
        price_of: impl Fn(CommodityId) -> f64,
        das_yield_bonus: f64,
        tick: u64,
    ) -> DeskTickOutcome {
        let mut outcome = DeskTickOutcome::default();
        let rating_before = self.rating;

        // Defaults first: a position trading below half its securitization
        // price is written off and the collateral forfeited.
        let mut i = 0;
        while i < self.securities.len() {
            let das = &self.securities[i];
            let price = price_of(das.commodity);
            if price < das.securitization_price * DAS_DEFAULT_THRESHOLD {
                let das = self.securities.remove(i);
                debug!(id = das.id, commodity = ?das.commodity, "position defaulted");
                outcome.defaults.push((das.id, das.commodity));
                self.rating = self.rating.downgraded();
                self.last_default_tick = Some(tick);
            } else {
                i += 1;
            }
        }

        // Coupons, with concentration decay across same-commodity positions.
        outcome.income = self.yield_per_tick(&price_of, das_yield_bonus);

        // Interest compounds onto the principal.
        let interest = self.interest_per_tick();
        if interest > 0.0 {
            self.debt += interest;
            self.interest_paid += interest;
            outcome.debt_changed = true;
        }

        // Margin call: over-levered books shed their weakest position.
        let portfolio = self.portfolio_value(&price_of);
        if portfolio > 0.0 && self.debt / portfolio > MARGIN_CALL_THRESHOLD {
            if let Some(idx) = self.lowest_value_position(&price_of) {
                let das = self.securities.remove(idx);
                let proceeds = das.quantity * price_of(das.commodity);
                self.debt = (self.debt - proceeds).max(0.0);
                self.rating = self.rating.downgraded();
                outcome.margin_liquidated = Some(das.id);
                outcome.debt_changed = true;
                info!(id = das.id, proceeds, "margin call liquidated position");
            }
        }

        self.review_rating(&price_of, tick);

        if self.rating != rating_before {
            outcome.rating_change = Some(self.rating);
        }
        outcome
    }

    fn lowest_value_position(&self, price_of: &impl Fn(CommodityId) -> f64) -> Option<usize> {
        self.securities
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                let va = a.quantity * price_of(a.commodity);
                let vb = b.quantity * price_of(b.commodity);
                va.total_cmp(&vb)
            })
            .map(|(idx, _)| idx)
    }

    fn review_rating(&mut self, price_of: &impl Fn(CommodityId) -> f64, tick: u64) {
        self.ticks_since_review += 1;
        if self.ticks_since_review < RATING_REVIEW_INTERVAL {
            return;
        }
        self.ticks_since_review = 0;

        let portfolio = self.portfolio_value(price_of);
        let ratio = if portfolio > 0.0 {
            self.debt / portfolio
        } else if self.debt > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        if ratio > RATING_DEGRADE_RATIO {
            self.high_debt_reviews += 1;
            if self.high_debt_reviews >= RATING_DEGRADE_REVIEWS {
                self.rating = self.rating.downgraded();
                self.high_debt_reviews = 0;
                debug!(rating = self.rating.label(), "rating review: downgrade");
            }
            return;
        }
        self.high_debt_reviews = 0;

        let clean_history = self
            .last_default_tick
            .map_or(true, |t| tick.saturating_sub(t) >= RATING_NO_DEFAULT_WINDOW);
        let mut commodities: Vec<CommodityId> =
            self.securities.iter().map(|das| das.commodity).collect();
        commodities.sort_unstable();
        commodities.dedup();

        if ratio < RATING_IMPROVE_RATIO
            && clean_history
            && commodities.len() >= RATING_DIVERSIFICATION_MIN
        {
            self.rating = self.rating.upgraded();
            debug!(rating = self.rating.label(), "rating review: upgrade");
        }
    }

    /// Borrow against the book, capped by the rating's leverage ratio.
    pub fn borrow(&mut self, amount: f64, price_of: impl Fn(CommodityId) -> f64) -> bool {
        if amount <= 0.0 || amount > self.borrow_capacity(price_of) {
            return false;
        }
        self.debt += amount;
        true
    }

    /// Repay debt; returns the amount actually applied.
    pub fn repay(&mut self, amount: f64) -> f64 {
        let applied = amount.min(self.debt).max(0.0);
        self.debt -= applied;
        applied
    }

    /// Wipe the book and debt. Rating history resets with it.
    pub fn reset(&mut self) {
        *self = Desk::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_price(p: f64) -> impl Fn(CommodityId) -> f64 {
        move |_| p
    }

    fn desk_with_position(price: f64) -> Desk {
        let mut desk = Desk::new();
        desk.securitize(CommodityId::Dom, 100.0, price, 50.0, 100.0, 0);
        desk
    }

    #[test]
    fn rejects_undersized_and_overflowing_positions() {
        let mut desk = Desk::new();
        assert!(desk
            .securitize(CommodityId::Dom, 9.9, 1.0, 0.0, 0.0, 0)
            .is_none());
        for _ in 0..DAS_MAX_POSITIONS {
            assert!(desk
                .securitize(CommodityId::Dom, 10.0, 1.0, 0.0, 0.0, 0)
                .is_some());
        }
        assert!(desk
            .securitize(CommodityId::Dom, 10.0, 1.0, 0.0, 0.0, 0)
            .is_none());
    }

    #[test]
    fn unwind_returns_collateral_details() {
        let mut desk = Desk::new();
        let id = desk
            .securitize(CommodityId::Bw, 25.0, 2.0, 30.0, 20.0, 5)
            .unwrap();
        let das = desk.unwind(id).unwrap();
        assert_eq!(das.quantity, 25.0);
        assert_eq!(das.cost_basis, 30.0);
        assert_eq!(das.purchased_quantity, 20.0);
        assert!(desk.unwind(id).is_none());
    }

    #[test]
    fn coupon_scales_with_rating() {
        let mut desk = desk_with_position(1.0);
        let at_c = desk.process_tick(flat_price(1.0), 0.0, 1).income;
        // C pays 1.0x; expected base coupon.
        assert!((at_c - DAS_BASE_YIELD * 100.0).abs() < 1e-12);
    }

    #[test]
    fn concentration_decay_compounds() {
        let mut desk = Desk::new();
        desk.securitize(CommodityId::Dom, 100.0, 1.0, 0.0, 0.0, 0);
        let single = desk.process_tick(flat_price(1.0), 0.0, 1).income;
        desk.securitize(CommodityId::Dom, 100.0, 1.0, 0.0, 0.0, 0);
        let double = desk.process_tick(flat_price(1.0), 0.0, 2).income;
        // Each of the two positions now pays at 0.75x.
        assert!((double - single * 2.0 * DAS_SAME_COMMODITY_DECAY).abs() < 1e-9);
    }

    #[test]
    fn default_forfeits_and_downgrades() {
        let mut desk = desk_with_position(10.0);
        let outcome = desk.process_tick(flat_price(4.9), 0.0, 3);
        assert_eq!(outcome.defaults.len(), 1);
        assert!(desk.securities().is_empty());
        assert_eq!(desk.rating(), CreditRating::D);
        assert_eq!(outcome.rating_change, Some(CreditRating::D));
    }

    #[test]
    fn per_tick_accessors_match_the_tick() {
        let mut desk = desk_with_position(1.0);
        desk.securitize(CommodityId::Bw, 50.0, 1.0, 0.0, 0.0, 0);
        assert!(desk.borrow(30.0, flat_price(1.0)));

        let expected_yield = desk.yield_per_tick(flat_price(1.0), 0.1);
        let expected_interest = desk.interest_per_tick();
        let debt_before = desk.debt();
        let outcome = desk.process_tick(flat_price(1.0), 0.1, 1);

        assert!((outcome.income - expected_yield).abs() < 1e-12);
        assert!((desk.debt() - debt_before - expected_interest).abs() < 1e-12);
    }

    #[test]
    fn interest_compounds_onto_debt() {
        let mut desk = desk_with_position(1.0);
        assert!(desk.borrow(40.0, flat_price(1.0)));
        let before = desk.debt();
        desk.process_tick(flat_price(1.0), 0.0, 1);
        let expected = before * (1.0 + CreditRating::C.interest_rate());
        assert!((desk.debt() - expected).abs() < 1e-12);
        assert!(desk.interest_paid() > 0.0);
    }

    #[test]
    fn borrow_respects_leverage_cap() {
        let mut desk = desk_with_position(1.0);
        // C-rated leverage is 0.5 of a 100-value book.
        assert!(!desk.borrow(51.0, flat_price(1.0)));
        assert!(desk.borrow(50.0, flat_price(1.0)));
        assert!(!desk.borrow(0.01, flat_price(1.0)));
    }

    #[test]
    fn repay_clamps_to_debt() {
        let mut desk = desk_with_position(1.0);
        assert!(desk.borrow(20.0, flat_price(1.0)));
        assert_eq!(desk.repay(100.0), 20.0);
        assert_eq!(desk.debt(), 0.0);
    }

    #[test]
    fn margin_call_liquidates_lowest_value() {
        let mut desk = Desk::new();
        let small = desk
            .securitize(CommodityId::Dom, 10.0, 1.0, 0.0, 0.0, 0)
            .unwrap();
        desk.securitize(CommodityId::Bw, 100.0, 1.0, 0.0, 0.0, 0);
        assert!(desk.borrow(55.0, flat_price(1.0)));
        // Force the ratio over the threshold by crashing the book value,
        // but not far enough to trigger defaults.
        let outcome = desk.process_tick(flat_price(0.55), 0.0, 1);
        assert_eq!(outcome.margin_liquidated, Some(small));
        assert_eq!(desk.securities().len(), 1);
        assert!(desk.debt() < 55.1);
        assert_eq!(desk.rating(), CreditRating::D);
    }

    #[test]
    fn sustained_high_debt_downgrades_on_review() {
        let mut desk = desk_with_position(1.0);
        assert!(desk.borrow(45.0, flat_price(1.0)));
        let mut downgraded = false;
        // A price slump to 0.6 pins the ratio at 0.75: above the degrade
        // threshold, below the margin call line, above the default trigger.
        for tick in 1..=u64::from(RATING_REVIEW_INTERVAL * RATING_DEGRADE_REVIEWS + 5) {
            let outcome = desk.process_tick(flat_price(0.6), 0.0, tick);
            desk.repay(desk.debt() - 45.0);
            if outcome.rating_change == Some(CreditRating::D) {
                downgraded = true;
                break;
            }
        }
        assert!(downgraded);
    }

    #[test]
    fn diversification_and_clean_history_upgrade() {
        let mut desk = Desk::new();
        desk.securitize(CommodityId::Dom, 100.0, 1.0, 0.0, 0.0, 0);
        desk.securitize(CommodityId::Bw, 100.0, 1.0, 0.0, 0.0, 0);
        desk.securitize(CommodityId::Soft, 100.0, 1.0, 0.0, 0.0, 0);
        let mut upgraded = false;
        for tick in 1..=u64::from(RATING_REVIEW_INTERVAL) + 1 {
            let outcome = desk.process_tick(flat_price(1.0), 0.0, tick);
            if outcome.rating_change == Some(CreditRating::B) {
                upgraded = true;
            }
        }
        assert!(upgraded);
        assert_eq!(desk.rating(), CreditRating::B);
    }

    #[test]
    fn concentrated_book_never_upgrades() {
        let mut desk = Desk::new();
        desk.securitize(CommodityId::Dom, 100.0, 1.0, 0.0, 0.0, 0);
        desk.securitize(CommodityId::Dom, 100.0, 1.0, 0.0, 0.0, 0);
        for tick in 1..=u64::from(RATING_REVIEW_INTERVAL) * 4 {
            desk.process_tick(flat_price(1.0), 0.0, tick);
        }
        assert_eq!(desk.rating(), STARTING_RATING);
    }

    #[test]
    fn reset_clears_everything() {
        let mut desk = desk_with_position(1.0);
        assert!(desk.borrow(10.0, flat_price(1.0)));
        desk.reset();
        assert!(desk.securities().is_empty());
        assert_eq!(desk.debt(), 0.0);
        assert_eq!(desk.rating(), STARTING_RATING);
    }
}
