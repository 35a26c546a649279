//! One-shot purchasable upgrades.

use serde::{Deserialize, Serialize};

use crate::commodities::CommodityId;

/// Identifier for a one-shot upgrade.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum UpgradeId {
    BatchProcessing,
    TrendAnalysis,
    BulkOrders,
    LimitOrders,
    BlockTrading,
    CpuOverclock,
    QualityAssurance,
    OverclockIi,
    SupplyChain,
    QualityAssuranceIi,
    MovingAverage,
    AnalystReports,
    InsiderNewsletter,
    ConfidentialTip,
    MaterialAdvantage,
    SeasonalForecast,
    InsiderCalendar,
    HarvestEmail,
    HarvestAds,
    AutoscriptI,
    HarvestDom,
    HarvestBw,
    AutoscriptIi,
    HarvestSoft,
    HarvestVc,
    AutoscriptIii,
}

/// Upgrade catalog grouping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpgradeCategory {
    Trading,
    Production,
    Intelligence,
    Automation,
}

/// Static definition for one upgrade.
#[derive(Clone, Debug)]
pub struct UpgradeDef {
    /// Upgrade identifier.
    pub id: UpgradeId,
    /// Display name.
    pub name: &'static str,
    /// Flavor description.
    pub description: &'static str,
    /// Catalog grouping.
    pub category: UpgradeCategory,
    /// One-time cash cost.
    pub cost: f64,
}

/// All upgrade definitions.
pub const UPGRADES: [UpgradeDef; 26] = [
    UpgradeDef {
        id: UpgradeId::BatchProcessing,
        name: "Batch Processing",
        description: "Execute trades in quantities of 5.",
        category: UpgradeCategory::Trading,
        cost: 25.0,
    },
    UpgradeDef {
        id: UpgradeId::TrendAnalysis,
        name: "Trend Analysis Package",
        description: "Directional indicators overlaid on price charts.",
        category: UpgradeCategory::Trading,
        cost: 40.0,
    },
    UpgradeDef {
        id: UpgradeId::BulkOrders,
        name: "Bulk Order Processing",
        description: "Execute trades in quantities of 10.",
        category: UpgradeCategory::Trading,
        cost: 100.0,
    },
    UpgradeDef {
        id: UpgradeId::LimitOrders,
        name: "Limit Order System",
        description: "Set a target price. Holdings sold automatically.",
        category: UpgradeCategory::Trading,
        cost: 200.0,
    },
    UpgradeDef {
        id: UpgradeId::BlockTrading,
        name: "Block Trading",
        description: "Institutional-size lots. Execute trades in quantities of 50.",
        category: UpgradeCategory::Trading,
        cost: 400.0,
    },
    UpgradeDef {
        id: UpgradeId::CpuOverclock,
        name: "CPU Overclock",
        description: "Reduce production cycle by 1 tick. May cause instability.",
        category: UpgradeCategory::Production,
        cost: 75.0,
    },
    UpgradeDef {
        id: UpgradeId::QualityAssurance,
        name: "Quality Assurance",
        description: "Reduce output variance. Minimum yield 25% of max.",
        category: UpgradeCategory::Production,
        cost: 150.0,
    },
    UpgradeDef {
        id: UpgradeId::OverclockIi,
        name: "Overclock II",
        description: "Further cycle reduction. Total -2 ticks per cycle.",
        category: UpgradeCategory::Production,
        cost: 300.0,
    },
    UpgradeDef {
        id: UpgradeId::SupplyChain,
        name: "Supply Chain Integration",
        description: "Convert surplus commodities into premium goods.",
        category: UpgradeCategory::Production,
        cost: 500.0,
    },
    UpgradeDef {
        id: UpgradeId::QualityAssuranceIi,
        name: "Quality Assurance II",
        description: "Tighter tolerances. Minimum yield 50% of max.",
        category: UpgradeCategory::Production,
        cost: 800.0,
    },
    UpgradeDef {
        id: UpgradeId::MovingAverage,
        name: "Moving Average Overlay",
        description: "Technical analysis tools for price chart.",
        category: UpgradeCategory::Intelligence,
        cost: 30.0,
    },
    UpgradeDef {
        id: UpgradeId::AnalystReports,
        name: "Analyst Reports",
        description: "Numerical trend strength indicators.",
        category: UpgradeCategory::Intelligence,
        cost: 50.0,
    },
    UpgradeDef {
        id: UpgradeId::InsiderNewsletter,
        name: "Insider Newsletter",
        description: "Advance notice of market-moving events. 10 second lead time.",
        category: UpgradeCategory::Intelligence,
        cost: 80.0,
    },
    UpgradeDef {
        id: UpgradeId::ConfidentialTip,
        name: "Confidential Tip",
        description: "A friend at the fund. Trend duration countdown visible on charts.",
        category: UpgradeCategory::Intelligence,
        cost: 125.0,
    },
    UpgradeDef {
        id: UpgradeId::MaterialAdvantage,
        name: "Material Advantage",
        description: "Material non-public information. Estimated price target on charts.",
        category: UpgradeCategory::Intelligence,
        cost: 200.0,
    },
    UpgradeDef {
        id: UpgradeId::SeasonalForecast,
        name: "Seasonal Forecast",
        description: "Quarterly outlook report. Shows the next trend direction after the current one ends.",
        category: UpgradeCategory::Intelligence,
        cost: 350.0,
    },
    UpgradeDef {
        id: UpgradeId::InsiderCalendar,
        name: "Insider Calendar",
        description: "The full schedule. Upcoming trend sequence visible as a forecast bar on charts.",
        category: UpgradeCategory::Intelligence,
        cost: 600.0,
    },
    UpgradeDef {
        id: UpgradeId::HarvestEmail,
        name: "EMAIL Harvester",
        description: "Automated scraper. +1 EMAIL per harvest click.",
        category: UpgradeCategory::Automation,
        cost: 15.0,
    },
    UpgradeDef {
        id: UpgradeId::HarvestAds,
        name: "ADS Generator",
        description: "Impression bot. +1 ADS per harvest click.",
        category: UpgradeCategory::Automation,
        cost: 50.0,
    },
    UpgradeDef {
        id: UpgradeId::AutoscriptI,
        name: "Autoscript I",
        description: "Basic automation. +25% harvest yield for all commodities.",
        category: UpgradeCategory::Automation,
        cost: 100.0,
    },
    UpgradeDef {
        id: UpgradeId::HarvestDom,
        name: "DOM Registrar",
        description: "Bulk registration script. +1 DOM per harvest click.",
        category: UpgradeCategory::Automation,
        cost: 150.0,
    },
    UpgradeDef {
        id: UpgradeId::HarvestBw,
        name: "BW Allocator",
        description: "Bandwidth provisioner. +1 BW per harvest click.",
        category: UpgradeCategory::Automation,
        cost: 400.0,
    },
    UpgradeDef {
        id: UpgradeId::AutoscriptIi,
        name: "Autoscript II",
        description: "Advanced automation. +50% harvest yield for all commodities.",
        category: UpgradeCategory::Automation,
        cost: 700.0,
    },
    UpgradeDef {
        id: UpgradeId::HarvestSoft,
        name: "SOFT Compiler",
        description: "License keygen. +1 SOFT per harvest click.",
        category: UpgradeCategory::Automation,
        cost: 1000.0,
    },
    UpgradeDef {
        id: UpgradeId::HarvestVc,
        name: "VC Pipeline",
        description: "Pitch deck generator. +1 VC per harvest click.",
        category: UpgradeCategory::Automation,
        cost: 2500.0,
    },
    UpgradeDef {
        id: UpgradeId::AutoscriptIii,
        name: "Autoscript III",
        description: "Full automation suite. +75% harvest yield for all commodities.",
        category: UpgradeCategory::Automation,
        cost: 4000.0,
    },
];

/// Look up the static definition for an upgrade. The table is ordered by
/// variant, which `validate_tables` and the tests below pin.
pub fn upgrade_def(id: UpgradeId) -> &'static UpgradeDef {
    &UPGRADES[id as usize]
}

/// The per-commodity harvest upgrade, if one exists for the commodity.
pub fn harvest_upgrade(id: CommodityId) -> Option<UpgradeId> {
    match id {
        CommodityId::Email => Some(UpgradeId::HarvestEmail),
        CommodityId::Ads => Some(UpgradeId::HarvestAds),
        CommodityId::Dom => Some(UpgradeId::HarvestDom),
        CommodityId::Bw => Some(UpgradeId::HarvestBw),
        CommodityId::Soft => Some(UpgradeId::HarvestSoft),
        CommodityId::Vc => Some(UpgradeId::HarvestVc),
        CommodityId::Live | CommodityId::Glue => None,
    }
}

/// Autoscript harvest yield bonus for a given tier (1-3).
pub const AUTOSCRIPT_BONUS: [f64; 3] = [0.25, 0.5, 0.75];

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_IDS: [UpgradeId; 26] = [
        UpgradeId::BatchProcessing,
        UpgradeId::TrendAnalysis,
        UpgradeId::BulkOrders,
        UpgradeId::LimitOrders,
        UpgradeId::BlockTrading,
        UpgradeId::CpuOverclock,
        UpgradeId::QualityAssurance,
        UpgradeId::OverclockIi,
        UpgradeId::SupplyChain,
        UpgradeId::QualityAssuranceIi,
        UpgradeId::MovingAverage,
        UpgradeId::AnalystReports,
        UpgradeId::InsiderNewsletter,
        UpgradeId::ConfidentialTip,
        UpgradeId::MaterialAdvantage,
        UpgradeId::SeasonalForecast,
        UpgradeId::InsiderCalendar,
        UpgradeId::HarvestEmail,
        UpgradeId::HarvestAds,
        UpgradeId::AutoscriptI,
        UpgradeId::HarvestDom,
        UpgradeId::HarvestBw,
        UpgradeId::AutoscriptIi,
        UpgradeId::HarvestSoft,
        UpgradeId::HarvestVc,
        UpgradeId::AutoscriptIii,
    ];

    #[test]
    fn every_variant_has_a_def() {
        for id in ALL_IDS {
            assert_eq!(upgrade_def(id).id, id);
        }
    }

    #[test]
    fn costs_are_positive() {
        for u in &UPGRADES {
            assert!(u.cost > 0.0, "{}", u.name);
        }
    }
}
