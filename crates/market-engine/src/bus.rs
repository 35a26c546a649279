//! Synchronous in-process event bus.
//!
//! Listeners run inline during emission, on the same thread, in
//! registration order. Contract: listeners must not re-enter mutating
//! engine calls during dispatch; the engine does not defend against
//! reentrancy.

use market_core::{CommodityId, CreditRating, FactoryId, InfluenceId, UpgradeId};

use crate::engine::TradeResult;
use crate::org::MoraleNotice;

/// Domain events emitted by the engine. Payloads are owned copies.
#[derive(Clone, Debug)]
pub enum EngineEvent {
    /// Cash balance changed.
    MoneyChanged { cash: f64 },
    /// Holdings changed.
    PortfolioChanged,
    /// A simulation tick completed.
    MarketTick { tick: u64 },
    /// A progression phase unlocked (one-shot).
    PhaseUnlocked { phase: u8 },
    /// A commodity became tradable (one-shot).
    CommodityUnlocked { commodity: CommodityId },
    /// An upgrade was purchased.
    UpgradeAcquired { upgrade: UpgradeId },
    /// A factory unit was deployed.
    FactoryDeployed { factory: FactoryId },
    /// An influence operation executed.
    InfluenceExecuted {
        influence: InfluenceId,
        target: CommodityId,
    },
    /// A news item hit the ticker; `upcoming` marks insider previews.
    NewsEvent { text: String, upcoming: bool },
    /// A buy or sell settled.
    TradeExecuted { trade: TradeResult },
    /// A limit order filled.
    LimitOrderFilled {
        commodity: CommodityId,
        quantity: f64,
        price: f64,
    },
    /// A manual harvest produced units.
    HarvestExecuted { commodity: CommodityId, quantity: f64 },
    /// An HR notice (quit or raise demand).
    MoraleEvent { notice: MoraleNotice },
    /// Org chart structure changed.
    OrgChartChanged,
    /// An employee was hired.
    EmployeeHired { name: String },
    /// An employee was fired or shed.
    EmployeeFired { name: String },
    /// A DAS position was created.
    DasCreated { id: u32 },
    /// A DAS position was unwound; collateral returned.
    DasUnwound { id: u32 },
    /// A DAS position defaulted; collateral forfeited.
    DasDefaulted { id: u32, commodity: CommodityId },
    /// Credit rating moved.
    RatingChanged { rating: CreditRating },
    /// Outstanding debt changed.
    DebtChanged { debt: f64 },
    /// Margin call force-liquidated a position.
    MarginEvent { liquidated: u32 },
    /// Catch-all for minor state changes (limit order add/remove).
    StateChanged,
}

/// Discriminant for subscription filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    MoneyChanged,
    PortfolioChanged,
    MarketTick,
    PhaseUnlocked,
    CommodityUnlocked,
    UpgradeAcquired,
    FactoryDeployed,
    InfluenceExecuted,
    NewsEvent,
    TradeExecuted,
    LimitOrderFilled,
    HarvestExecuted,
    MoraleEvent,
    OrgChartChanged,
    EmployeeHired,
    EmployeeFired,
    DasCreated,
    DasUnwound,
    DasDefaulted,
    RatingChanged,
    DebtChanged,
    MarginEvent,
    StateChanged,
}

impl EngineEvent {
    /// The event's kind discriminant.
    pub fn kind(&self) -> EventKind {
        match self {
            EngineEvent::MoneyChanged { .. } => EventKind::MoneyChanged,
            EngineEvent::PortfolioChanged => EventKind::PortfolioChanged,
            EngineEvent::MarketTick { .. } => EventKind::MarketTick,
            EngineEvent::PhaseUnlocked { .. } => EventKind::PhaseUnlocked,
            EngineEvent::CommodityUnlocked { .. } => EventKind::CommodityUnlocked,
            EngineEvent::UpgradeAcquired { .. } => EventKind::UpgradeAcquired,
            EngineEvent::FactoryDeployed { .. } => EventKind::FactoryDeployed,
            EngineEvent::InfluenceExecuted { .. } => EventKind::InfluenceExecuted,
            EngineEvent::NewsEvent { .. } => EventKind::NewsEvent,
            EngineEvent::TradeExecuted { .. } => EventKind::TradeExecuted,
            EngineEvent::LimitOrderFilled { .. } => EventKind::LimitOrderFilled,
            EngineEvent::HarvestExecuted { .. } => EventKind::HarvestExecuted,
            EngineEvent::MoraleEvent { .. } => EventKind::MoraleEvent,
            EngineEvent::OrgChartChanged => EventKind::OrgChartChanged,
            EngineEvent::EmployeeHired { .. } => EventKind::EmployeeHired,
            EngineEvent::EmployeeFired { .. } => EventKind::EmployeeFired,
            EngineEvent::DasCreated { .. } => EventKind::DasCreated,
            EngineEvent::DasUnwound { .. } => EventKind::DasUnwound,
            EngineEvent::DasDefaulted { .. } => EventKind::DasDefaulted,
            EngineEvent::RatingChanged { .. } => EventKind::RatingChanged,
            EngineEvent::DebtChanged { .. } => EventKind::DebtChanged,
            EngineEvent::MarginEvent { .. } => EventKind::MarginEvent,
            EngineEvent::StateChanged => EventKind::StateChanged,
        }
    }
}

struct Subscriber {
    filter: Option<EventKind>,
    callback: Box<dyn FnMut(&EngineEvent)>,
}

/// Registered-handler fan-out. Not serialized; listeners re-register after
/// a restore.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Subscriber>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        EventBus::default()
    }

    /// Subscribe to one event kind.
    pub fn on<F>(&mut self, kind: EventKind, callback: F)
    where
        F: FnMut(&EngineEvent) + 'static,
    {
        self.subscribers.push(Subscriber {
            filter: Some(kind),
            callback: Box::new(callback),
        });
    }

    /// Subscribe to every event.
    pub fn on_any<F>(&mut self, callback: F)
    where
        F: FnMut(&EngineEvent) + 'static,
    {
        self.subscribers.push(Subscriber {
            filter: None,
            callback: Box::new(callback),
        });
    }

    /// Dispatch an event to all matching subscribers, inline.
    pub fn emit(&mut self, event: &EngineEvent) {
        let kind = event.kind();
        for sub in &mut self.subscribers {
            if sub.filter.is_none() || sub.filter == Some(kind) {
                (sub.callback)(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn filtered_subscription_only_sees_its_kind() {
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        bus.on(EventKind::MoneyChanged, move |e| {
            sink.borrow_mut().push(e.kind());
        });
        bus.emit(&EngineEvent::MoneyChanged { cash: 1.0 });
        bus.emit(&EngineEvent::PortfolioChanged);
        bus.emit(&EngineEvent::MoneyChanged { cash: 2.0 });
        assert_eq!(
            *seen.borrow(),
            vec![EventKind::MoneyChanged, EventKind::MoneyChanged]
        );
    }

    #[test]
    fn firehose_sees_everything() {
        let mut bus = EventBus::new();
        let count = Rc::new(RefCell::new(0usize));
        let sink = Rc::clone(&count);
        bus.on_any(move |_| *sink.borrow_mut() += 1);
        bus.emit(&EngineEvent::StateChanged);
        bus.emit(&EngineEvent::MarketTick { tick: 1 });
        assert_eq!(*count.borrow(), 2);
    }
}
