//! Serializable save data and a read-only view for frontends.
//!
//! Event bus subscriptions are not part of a save; callers re-register
//! after a restore.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use market_core::{
    CommodityId, CreditRating, FactoryId, InfluenceId, UpgradeId, COMMODITIES, MARKET_EVENTS,
};

use crate::bus::EventBus;
use crate::desk::Desk;
use crate::engine::{DeferredSell, Holding, LimitOrder, MarketEngine, NoExternalBonuses};
use crate::market::MarketState;
use crate::org::OrgChart;
use crate::rng::SeededRng;

const SAVE_VERSION: u32 = 1;

/// Why a save file was rejected.
#[derive(Debug, Error)]
pub enum RestoreError {
    #[error("unsupported save version {0}")]
    UnsupportedVersion(u32),
    #[error("save is missing a market for {0:?}")]
    MissingMarket(CommodityId),
    #[error("save references an unknown market event")]
    UnknownEvent,
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

/// Complete persistable engine state.
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    version: u32,
    cash: f64,
    lifetime_earnings: f64,
    tick_count: u64,
    rng: SeededRng,
    markets: BTreeMap<CommodityId, MarketState>,
    holdings: BTreeMap<CommodityId, Holding>,
    factories: BTreeMap<FactoryId, u32>,
    factory_counters: BTreeMap<FactoryId, u32>,
    owned_upgrades: BTreeSet<UpgradeId>,
    unlocked_commodities: BTreeSet<CommodityId>,
    unlocked_phases: BTreeSet<u8>,
    influence_cooldowns: BTreeMap<InfluenceId, u64>,
    limit_orders: Vec<LimitOrder>,
    deferred_sells: Vec<DeferredSell>,
    current_news: String,
    upcoming_event: Option<(usize, u32)>,
    ticks_since_event: u32,
    next_event_gap: u32,
    org: OrgChart,
    desk: Desk,
}

impl SaveData {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, RestoreError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<SaveData, RestoreError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Read-only summary for frontends; cheap to build every frame.
#[derive(Clone, Debug, Serialize)]
pub struct GameSnapshot {
    pub tick: u64,
    pub cash: f64,
    pub lifetime_earnings: f64,
    pub news: String,
    pub prices: BTreeMap<CommodityId, f64>,
    pub holdings: BTreeMap<CommodityId, Holding>,
    pub unlocked_phases: BTreeSet<u8>,
    pub rating: CreditRating,
    pub debt: f64,
    pub employee_count: usize,
}

impl MarketEngine {
    /// Capture the full engine state for persistence.
    pub fn save(&self) -> SaveData {
        SaveData {
            version: SAVE_VERSION,
            cash: self.cash,
            lifetime_earnings: self.lifetime_earnings,
            tick_count: self.tick_count,
            rng: self.rng.clone(),
            markets: self.markets.clone(),
            holdings: self.holdings.clone(),
            factories: self.factories.clone(),
            factory_counters: self.factory_counters.clone(),
            owned_upgrades: self.owned_upgrades.clone(),
            unlocked_commodities: self.unlocked_commodities.clone(),
            unlocked_phases: self.unlocked_phases.clone(),
            influence_cooldowns: self.influence_cooldowns.clone(),
            limit_orders: self.limit_orders.clone(),
            deferred_sells: self.deferred_sells.clone(),
            current_news: self.current_news.clone(),
            upcoming_event: self.upcoming_event,
            ticks_since_event: self.ticks_since_event,
            next_event_gap: self.next_event_gap,
            org: self.org.clone(),
            desk: self.desk.clone(),
        }
    }

    /// Rebuild an engine from save data. The bus starts empty and the
    /// bonus provider resets to the no-op default.
    pub fn restore(save: SaveData) -> Result<MarketEngine, RestoreError> {
        if save.version != SAVE_VERSION {
            return Err(RestoreError::UnsupportedVersion(save.version));
        }
        for def in COMMODITIES.iter() {
            if !save.markets.contains_key(&def.id) {
                return Err(RestoreError::MissingMarket(def.id));
            }
        }
        if let Some((idx, _)) = save.upcoming_event {
            if idx >= MARKET_EVENTS.len() {
                return Err(RestoreError::UnknownEvent);
            }
        }

        // Construction draws from the generator to build throwaway state;
        // the saved generator is reinstated right after.
        let mut engine = MarketEngine::with_rng(save.rng.clone());
        engine.rng = save.rng;
        engine.cash = save.cash;
        engine.lifetime_earnings = save.lifetime_earnings;
        engine.tick_count = save.tick_count;
        engine.markets = save.markets;
        engine.holdings = save.holdings;
        engine.factories = save.factories;
        engine.factory_counters = save.factory_counters;
        engine.owned_upgrades = save.owned_upgrades;
        engine.unlocked_commodities = save.unlocked_commodities;
        engine.unlocked_phases = save.unlocked_phases;
        engine.influence_cooldowns = save.influence_cooldowns;
        engine.limit_orders = save.limit_orders;
        engine.deferred_sells = save.deferred_sells;
        engine.current_news = save.current_news;
        engine.upcoming_event = save.upcoming_event;
        engine.ticks_since_event = save.ticks_since_event;
        engine.next_event_gap = save.next_event_gap;
        engine.org = save.org;
        engine.desk = save.desk;
        engine.bus = EventBus::new();
        engine.set_bonus_provider(Box::new(NoExternalBonuses));
        Ok(engine)
    }

    /// Build the read-only frontend view.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            tick: self.tick_count,
            cash: self.cash,
            lifetime_earnings: self.lifetime_earnings,
            news: self.current_news.clone(),
            prices: self.markets.iter().map(|(c, m)| (*c, m.price)).collect(),
            holdings: self.holdings.clone(),
            unlocked_phases: self.unlocked_phases.clone(),
            rating: self.desk.rating(),
            debt: self.desk.debt(),
            employee_count: self.org.employee_count(),
        }
    }
}
