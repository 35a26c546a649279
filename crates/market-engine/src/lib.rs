//! Deterministic market-economy simulation engine.
//!
//! [`MarketEngine`] owns every subsystem: per-commodity price models with a
//! buffered trend forecast, factory production, one-shot upgrades, market
//! influence operations, news events, an HR org chart, and a leveraged
//! structured-products desk. All randomness flows through one seeded
//! Park-Miller generator, so a seed plus a command sequence replays
//! byte-identically. Frontends drive the engine by calling operations and
//! subscribing to the [`bus::EventBus`].

#![deny(warnings)]

pub mod bus;
pub mod desk;
pub mod engine;
pub mod market;
pub mod org;
pub mod rng;
pub mod snapshot;

pub use bus::{EngineEvent, EventBus, EventKind};
pub use desk::{Desk, DigitalAssetSecurity};
pub use engine::{
    BonusProvider, Holding, LimitOrder, MarketEngine, NoExternalBonuses, NoPrestigePerks,
    PrestigeProvider, TradeAction, TradeResult,
};
pub use market::{MarketState, TrendDirection, TrendSegment};
pub use org::{Employee, MoraleNotice, MoraleNoticeKind, OrgChart, SlotRef, VpSlot};
pub use rng::SeededRng;
pub use snapshot::{GameSnapshot, RestoreError, SaveData};
