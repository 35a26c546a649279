//! Per-commodity price model and trend scheduling.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use market_core::commodities::CommodityDef;
use market_core::constants::{
    MEAN_REVERSION_STRENGTH, PRICE_CEILING_FACTOR, PRICE_FLOOR_FACTOR,
    PRICE_HISTORY_LENGTH, SIM_YEAR_TICKS,
};
use market_core::CommodityId;

use crate::rng::SeededRng;

/// Direction of a trend segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    Bull,
    Bear,
    Flat,
}

/// A time-bounded directional price regime.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendSegment {
    /// Regime direction.
    pub direction: TrendDirection,
    /// Drift strength in [0.3, 1.0] (0 for the opening flat segment).
    pub strength: f64,
    /// Segment length in ticks.
    pub duration_ticks: u32,
}

/// Live market state for one commodity.
///
/// The trend queue always buffers at least one simulated year (252 ticks)
/// of upcoming segments; completed segments roll into a history bounded by
/// the same span.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MarketState {
    /// Commodity this market trades.
    pub commodity: CommodityId,
    /// Current price, always clamped to the floor/ceiling band.
    pub price: f64,
    current: TrendSegment,
    elapsed: u32,
    queue: VecDeque<TrendSegment>,
    history: VecDeque<TrendSegment>,
    price_history: VecDeque<f64>,
    influence_multiplier: f64,
    influence_ticks_remaining: u32,
}

impl MarketState {
    /// Open a fresh market at the base price with a neutral opening segment.
    pub fn new(def: &CommodityDef, rng: &mut SeededRng) -> Self {
        let opening = TrendSegment {
            direction: TrendDirection::Flat,
            strength: 0.0,
            duration_ticks: rng.next_int(def.trend_min_ticks, def.trend_max_ticks),
        };
        let mut state = MarketState {
            commodity: def.id,
            price: def.base_price,
            current: opening,
            elapsed: 0,
            queue: VecDeque::new(),
            history: VecDeque::new(),
            price_history: VecDeque::from([def.base_price]),
            influence_multiplier: 0.0,
            influence_ticks_remaining: 0,
        };
        state.refill_queue(def, rng);
        state
    }

    fn generate_segment(def: &CommodityDef, rng: &mut SeededRng) -> TrendSegment {
        let r = rng.next_f64();
        let direction = if r < 0.35 {
            TrendDirection::Bull
        } else if r < 0.7 {
            TrendDirection::Bear
        } else {
            TrendDirection::Flat
        };
        TrendSegment {
            direction,
            strength: 0.3 + rng.next_f64() * 0.7,
            duration_ticks: rng.next_int(def.trend_min_ticks, def.trend_max_ticks),
        }
    }

    fn queued_ticks(&self) -> u32 {
        self.queue.iter().map(|s| s.duration_ticks).sum()
    }

    fn refill_queue(&mut self, def: &CommodityDef, rng: &mut SeededRng) {
        while self.queued_ticks() < SIM_YEAR_TICKS {
            let segment = Self::generate_segment(def, rng);
            self.queue.push_back(segment);
        }
    }

    /// Retire the current segment and activate the next queued one.
    ///
    /// The safety override is applied at activation time: a market already
    /// stretched past 5x base never activates another bull leg, and one
    /// crushed below 0.3x base never activates another bear leg.
    fn advance_trend(&mut self, def: &CommodityDef, rng: &mut SeededRng) {
        self.history.push_back(self.current);
        let mut history_ticks: u32 = self.history.iter().map(|s| s.duration_ticks).sum();
        while history_ticks > SIM_YEAR_TICKS {
            if let Some(old) = self.history.pop_front() {
                history_ticks -= old.duration_ticks;
            } else {
                break;
            }
        }

        let mut next = match self.queue.pop_front() {
            Some(segment) => segment,
            None => Self::generate_segment(def, rng),
        };

        let fraction = self.price / def.base_price;
        if fraction > 5.0 && next.direction == TrendDirection::Bull {
            next.direction = TrendDirection::Bear;
        } else if fraction < 0.3 && next.direction == TrendDirection::Bear {
            next.direction = TrendDirection::Bull;
        }

        self.current = next;
        self.elapsed = 0;
        self.refill_queue(def, rng);
    }

    /// Advance one tick: trend drift + noise + mean reversion + influence,
    /// clamped to the floor/ceiling band. Returns the new price.
    pub fn step_price(
        &mut self,
        def: &CommodityDef,
        rng: &mut SeededRng,
        noise_multiplier: f64,
    ) -> f64 {
        if self.elapsed >= self.current.duration_ticks {
            self.advance_trend(def, rng);
        }

        let drift = match self.current.direction {
            TrendDirection::Bull => self.current.strength * def.volatility,
            TrendDirection::Bear => -self.current.strength * def.volatility,
            TrendDirection::Flat => 0.0,
        };

        let noise =
            (rng.next_f64() - 0.5) * 2.0 * def.volatility * self.price * noise_multiplier;
        let mean_reversion = (def.base_price - self.price) * MEAN_REVERSION_STRENGTH;

        let mut influence = 0.0;
        if self.influence_ticks_remaining > 0 {
            influence = self.influence_multiplier * self.price;
            self.influence_ticks_remaining -= 1;
            if self.influence_ticks_remaining == 0 {
                self.influence_multiplier = 0.0;
            }
        }

        self.price += drift * self.price + noise + mean_reversion + influence;
        self.price = clamp_price(def, self.price);

        self.price_history.push_back(self.price);
        if self.price_history.len() > PRICE_HISTORY_LENGTH {
            self.price_history.pop_front();
        }

        self.elapsed += 1;
        self.price
    }

    /// Apply a one-shot multiplicative shock (news events, corner market).
    pub fn apply_shock(&mut self, def: &CommodityDef, fraction: f64) {
        self.price = clamp_price(def, self.price * (1.0 + fraction));
    }

    /// Spread a total price effect linearly over `duration` ticks.
    pub fn apply_influence(&mut self, total_effect: f64, duration: u32) {
        if duration == 0 {
            return;
        }
        self.influence_multiplier = total_effect / f64::from(duration);
        self.influence_ticks_remaining = duration;
    }

    /// The active trend segment.
    pub fn trend(&self) -> &TrendSegment {
        &self.current
    }

    /// Ticks remaining in the active segment.
    pub fn trend_ticks_remaining(&self) -> u32 {
        self.current.duration_ticks.saturating_sub(self.elapsed)
    }

    /// Upcoming queued segments, soonest first.
    pub fn forecast(&self) -> impl Iterator<Item = &TrendSegment> {
        self.queue.iter()
    }

    /// Completed segments, oldest first, bounded to one simulated year.
    pub fn trend_history(&self) -> impl Iterator<Item = &TrendSegment> {
        self.history.iter()
    }

    /// Recorded prices, oldest first.
    pub fn price_history(&self) -> &VecDeque<f64> {
        &self.price_history
    }

    /// Mean over the recorded price window.
    pub fn moving_average(&self) -> f64 {
        if self.price_history.is_empty() {
            return self.price;
        }
        self.price_history.iter().sum::<f64>() / self.price_history.len() as f64
    }
}

fn clamp_price(def: &CommodityDef, price: f64) -> f64 {
    let floor = def.base_price * PRICE_FLOOR_FACTOR;
    let ceiling = def.base_price * PRICE_CEILING_FACTOR;
    price.clamp(floor, ceiling)
}
