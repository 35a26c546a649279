//! Market-manipulation operations (phase 4).

use serde::{Deserialize, Serialize};

use crate::commodities::CommodityId;

/// Identifier for a market-influence operation.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum InfluenceId {
    PromoCampaign,
    NegativePress,
    PumpAndDump,
}

impl InfluenceId {
    /// All influence operations.
    pub const ALL: [InfluenceId; 3] = [
        InfluenceId::PromoCampaign,
        InfluenceId::NegativePress,
        InfluenceId::PumpAndDump,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Static definition for one influence operation.
#[derive(Clone, Debug)]
pub struct InfluenceDef {
    /// Influence identifier.
    pub id: InfluenceId,
    /// Display name.
    pub name: &'static str,
    /// Flavor description.
    pub description: &'static str,
    /// Cash consumed on execution.
    pub cash_cost: f64,
    /// Commodity quantities consumed on execution.
    pub commodity_costs: &'static [(CommodityId, f64)],
    /// Total price effect, spread linearly over the duration.
    pub price_effect: f64,
    /// Ticks the effect lasts.
    pub duration_ticks: u32,
    /// Ticks before the operation can be executed again.
    pub cooldown_ticks: u64,
}

/// All influence definitions.
pub const INFLUENCES: [InfluenceDef; 3] = [
    InfluenceDef {
        id: InfluenceId::PromoCampaign,
        name: "Promotional Campaign",
        description: "Generate artificial demand for selected commodity.",
        cash_cost: 25.0,
        commodity_costs: &[(CommodityId::Ads, 30.0)],
        price_effect: 0.4,
        duration_ticks: 12,
        cooldown_ticks: 36,
    },
    InfluenceDef {
        id: InfluenceId::NegativePress,
        name: "Negative Press Release",
        description: "Temporarily depress market value of target commodity.",
        cash_cost: 25.0,
        commodity_costs: &[(CommodityId::Email, 15.0)],
        price_effect: -0.3,
        duration_ticks: 12,
        cooldown_ticks: 36,
    },
    InfluenceDef {
        id: InfluenceId::PumpAndDump,
        name: "Pump and Dump",
        description: "Coordinated price inflation with automated liquidation.",
        cash_cost: 50.0,
        commodity_costs: &[(CommodityId::Ads, 20.0), (CommodityId::Email, 40.0)],
        price_effect: 0.6,
        duration_ticks: 6,
        cooldown_ticks: 72,
    },
];

/// Look up the static definition for an influence operation.
pub fn influence_def(id: InfluenceId) -> &'static InfluenceDef {
    &INFLUENCES[id.index()]
}
