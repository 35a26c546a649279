//! Global balance constants.

/// Cash a fresh ledger opens with.
pub const STARTING_CASH: f64 = 0.1;

/// Lifetime earnings required to unlock factories (phase 2).
pub const PHASE_FACTORIES_THRESHOLD: f64 = 3.0;

/// Lifetime earnings required to unlock upgrades (phase 3).
pub const PHASE_UPGRADES_THRESHOLD: f64 = 250.0;

/// Lifetime earnings required to unlock influence operations (phase 4).
pub const PHASE_INFLUENCE_THRESHOLD: f64 = 1500.0;

/// Lifetime earnings required to unlock the HR department (phase 5).
pub const PHASE_HR_THRESHOLD: f64 = 4000.0;

/// Lifetime earnings required to unlock the structured products desk (phase 6).
pub const PHASE_DESK_THRESHOLD: f64 = 10_000.0;

/// Phase unlock thresholds, `(phase, lifetime earnings)`. Phase 1 is free.
pub const PHASE_THRESHOLDS: [(u8, f64); 5] = [
    (2, PHASE_FACTORIES_THRESHOLD),
    (3, PHASE_UPGRADES_THRESHOLD),
    (4, PHASE_INFLUENCE_THRESHOLD),
    (5, PHASE_HR_THRESHOLD),
    (6, PHASE_DESK_THRESHOLD),
];

/// Lifetime earnings that unlock VP columns 3 and 4.
pub const ORG_EXPANSION_THRESHOLD: f64 = 25_000.0;

/// Ticks in one simulated market year; sizes the trend queue and history.
pub const SIM_YEAR_TICKS: u32 = 252;

/// Minimum ticks between random market events.
pub const EVENT_MIN_TICKS: u32 = 8;

/// Maximum ticks between random market events.
pub const EVENT_MAX_TICKS: u32 = 24;

/// Ticks a non-flavor event is announced ahead with the insider newsletter.
pub const EVENT_LEAD_TICKS: u32 = 4;

/// Samples retained in each price history ring.
pub const PRICE_HISTORY_LENGTH: usize = 500;

/// Price floor as a fraction of base price.
pub const PRICE_FLOOR_FACTOR: f64 = 0.1;

/// Price ceiling as a multiple of base price.
pub const PRICE_CEILING_FACTOR: f64 = 20.0;

/// Pull toward base price per tick.
pub const MEAN_REVERSION_STRENGTH: f64 = 0.005;

/// Notional float per commodity for corner-market detection.
pub const CORNER_MARKET_FLOAT: f64 = 200.0;

/// Fraction of the float that counts as cornering.
pub const CORNER_MARKET_THRESHOLD: f64 = 0.5;

/// Per-tick price boost while a market is cornered.
pub const CORNER_MARKET_PRICE_BOOST: f64 = 0.02;

/// Fraction of `harvest_quantity` produced per harvest with no upgrades.
pub const HARVEST_BASE_FRACTION: f64 = 0.05;

/// Additional fraction from the per-commodity harvest upgrade.
pub const HARVEST_UPGRADE_BONUS: f64 = 0.45;

/// Lower bound on the harvest price adjustment.
pub const HARVEST_PRICE_ADJUST_MIN: f64 = 0.75;

/// Upper bound on the harvest price adjustment.
pub const HARVEST_PRICE_ADJUST_MAX: f64 = 1.25;

/// Fraction of a pump-and-dump's duration before the scheduled auto-sell.
pub const PUMP_AUTO_SELL_FRACTION: f64 = 0.8;

/// Extra sell revenue fraction paid on the profitable purchased portion.
pub const CAPITAL_GAINS_BONUS: f64 = 0.25;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_thresholds_strictly_ascend() {
        for w in PHASE_THRESHOLDS.windows(2) {
            assert!(w[0].1 < w[1].1);
            assert_eq!(w[0].0 + 1, w[1].0);
        }
    }

    #[test]
    fn clamp_band_is_sane() {
        assert!(PRICE_FLOOR_FACTOR > 0.0 && PRICE_FLOOR_FACTOR < 1.0);
        assert!(PRICE_CEILING_FACTOR > 1.0);
    }
}
