//! Passive production facilities.

use serde::{Deserialize, Serialize};

use crate::commodities::CommodityId;

/// Identifier for a deployable factory type.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum FactoryId {
    /// Automated List Builder (EMAIL)
    ListBuilder,
    /// Banner Exchange (ADS)
    BannerExchange,
    /// Co-Location Rack (BW)
    ColocationRack,
    /// Offshore Dev Team (SOFT)
    OffshoreDev,
}

impl FactoryId {
    /// All factory types in cost order.
    pub const ALL: [FactoryId; 4] = [
        FactoryId::ListBuilder,
        FactoryId::BannerExchange,
        FactoryId::ColocationRack,
        FactoryId::OffshoreDev,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Input consumed by the supply-chain conversion bonus.
#[derive(Clone, Copy, Debug)]
pub struct ConversionInput {
    /// Commodity consumed per cycle.
    pub commodity: CommodityId,
    /// Quantity consumed per cycle.
    pub quantity: f64,
}

/// Static definition for one factory type.
#[derive(Clone, Debug)]
pub struct FactoryDef {
    /// Factory identifier.
    pub id: FactoryId,
    /// Display name.
    pub name: &'static str,
    /// Flavor description.
    pub description: &'static str,
    /// Commodity produced each completed cycle.
    pub produces: CommodityId,
    /// Base deployment cost; grows geometrically per unit owned.
    pub cost: f64,
    /// Minimum units produced per cycle per owned factory.
    pub min_output: u32,
    /// Maximum units produced per cycle per owned factory.
    pub max_output: u32,
    /// Ticks between completed production cycles.
    pub ticks_per_cycle: u32,
    /// Optional conversion input for the supply-chain upgrade.
    pub conversion_input: Option<ConversionInput>,
}

/// Geometric cost growth per unit already owned.
pub const FACTORY_COST_SCALING: f64 = 1.22;

/// All factory definitions.
pub const FACTORIES: [FactoryDef; 4] = [
    FactoryDef {
        id: FactoryId::ListBuilder,
        name: "Automated List Builder",
        description: "Harvests verified email addresses 24/7. Results may vary.",
        produces: CommodityId::Email,
        cost: 5.0,
        min_output: 0,
        max_output: 2,
        ticks_per_cycle: 2,
        conversion_input: None,
    },
    FactoryDef {
        id: FactoryId::BannerExchange,
        name: "Banner Exchange",
        description: "Rotating ad network. Impressions generated automatically.",
        produces: CommodityId::Ads,
        cost: 15.0,
        min_output: 0,
        max_output: 2,
        ticks_per_cycle: 3,
        conversion_input: Some(ConversionInput {
            commodity: CommodityId::Email,
            quantity: 6.0,
        }),
    },
    FactoryDef {
        id: FactoryId::ColocationRack,
        name: "Co-Location Rack",
        description: "Dedicated server hosting. Uptime not guaranteed.",
        produces: CommodityId::Bw,
        cost: 150.0,
        min_output: 0,
        max_output: 1,
        ticks_per_cycle: 3,
        conversion_input: Some(ConversionInput {
            commodity: CommodityId::Ads,
            quantity: 11.0,
        }),
    },
    FactoryDef {
        id: FactoryId::OffshoreDev,
        name: "Offshore Dev Team",
        description: "24-hour development cycle. Quality assurance pending.",
        produces: CommodityId::Soft,
        cost: 400.0,
        min_output: 0,
        max_output: 1,
        ticks_per_cycle: 5,
        conversion_input: Some(ConversionInput {
            commodity: CommodityId::Bw,
            quantity: 3.0,
        }),
    },
];

/// Look up the static definition for a factory type.
pub fn factory_def(id: FactoryId) -> &'static FactoryDef {
    &FACTORIES[id.index()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defs_indexed_by_id() {
        for id in FactoryId::ALL {
            assert_eq!(factory_def(id).id, id);
        }
    }

    #[test]
    fn costs_ascend_by_tier() {
        for w in FACTORIES.windows(2) {
            assert!(w[0].cost <= w[1].cost);
        }
    }

    #[test]
    fn lowest_tier_has_no_conversion_input() {
        assert!(factory_def(FactoryId::ListBuilder).conversion_input.is_none());
    }
}
