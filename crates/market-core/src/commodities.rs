//! Tradable commodity definitions.

use serde::{Deserialize, Serialize};

/// Ticker identifier for a tradable commodity.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum CommodityId {
    /// Email Databases
    Email,
    /// Banner Impressions
    Ads,
    /// Livestock
    Live,
    /// .com Domains
    Dom,
    /// Glue
    Glue,
    /// Bandwidth
    Bw,
    /// Software Licenses
    Soft,
    /// Venture Capital
    Vc,
}

impl CommodityId {
    /// All commodities in unlock order.
    pub const ALL: [CommodityId; 8] = [
        CommodityId::Email,
        CommodityId::Ads,
        CommodityId::Live,
        CommodityId::Dom,
        CommodityId::Glue,
        CommodityId::Bw,
        CommodityId::Soft,
        CommodityId::Vc,
    ];

    /// Exchange ticker string.
    pub fn ticker(self) -> &'static str {
        match self {
            CommodityId::Email => "EMAIL",
            CommodityId::Ads => "ADS",
            CommodityId::Live => "LIVE",
            CommodityId::Dom => "DOM",
            CommodityId::Glue => "GLUE",
            CommodityId::Bw => "BW",
            CommodityId::Soft => "SOFT",
            CommodityId::Vc => "VC",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Static balance data for one commodity.
#[derive(Clone, Debug)]
pub struct CommodityDef {
    /// Commodity identifier.
    pub id: CommodityId,
    /// Display name.
    pub name: &'static str,
    /// Flavor description.
    pub description: &'static str,
    /// Price a fresh market opens at; anchor for mean reversion and clamps.
    pub base_price: f64,
    /// Per-tick volatility scale.
    pub volatility: f64,
    /// Lifetime earnings required before the commodity can be traded.
    pub unlock_threshold: f64,
    /// Minimum trend segment duration in ticks.
    pub trend_min_ticks: u32,
    /// Maximum trend segment duration in ticks.
    pub trend_max_ticks: u32,
    /// Units produced per base harvest action. Equalizes dollar value per
    /// harvest across commodities (~$2 at base price).
    pub harvest_quantity: f64,
}

/// All commodity definitions, ordered by unlock threshold.
pub const COMMODITIES: [CommodityDef; 8] = [
    CommodityDef {
        id: CommodityId::Email,
        name: "Email Databases",
        description: "Verified opt-in addresses. Updated daily.",
        base_price: 0.05,
        volatility: 0.1,
        unlock_threshold: 0.0,
        trend_min_ticks: 6,
        trend_max_ticks: 15,
        harvest_quantity: 40.0,
    },
    CommodityDef {
        id: CommodityId::Ads,
        name: "Banner Impressions",
        description: "Premium 468x60 ad placements.",
        base_price: 0.25,
        volatility: 0.08,
        unlock_threshold: 0.0,
        trend_min_ticks: 8,
        trend_max_ticks: 20,
        harvest_quantity: 8.0,
    },
    CommodityDef {
        id: CommodityId::Live,
        name: "Livestock",
        description: "Grade-A cattle futures. Delivery not included.",
        base_price: 0.5,
        volatility: 0.065,
        unlock_threshold: 15.0,
        trend_min_ticks: 9,
        trend_max_ticks: 24,
        harvest_quantity: 4.0,
    },
    CommodityDef {
        id: CommodityId::Dom,
        name: ".com Domains",
        description: "Pre-registered premium domain names.",
        base_price: 2.0,
        volatility: 0.055,
        unlock_threshold: 30.0,
        trend_min_ticks: 10,
        trend_max_ticks: 28,
        harvest_quantity: 1.0,
    },
    CommodityDef {
        id: CommodityId::Glue,
        name: "Glue",
        description: "Industrial-strength adhesive. Handle with care.",
        base_price: 5.0,
        volatility: 0.045,
        unlock_threshold: 100.0,
        trend_min_ticks: 11,
        trend_max_ticks: 32,
        harvest_quantity: 0.4,
    },
    CommodityDef {
        id: CommodityId::Bw,
        name: "Bandwidth",
        description: "Dedicated T1 line capacity. 1.544 Mbps.",
        base_price: 8.0,
        volatility: 0.04,
        unlock_threshold: 200.0,
        trend_min_ticks: 12,
        trend_max_ticks: 36,
        harvest_quantity: 0.25,
    },
    CommodityDef {
        id: CommodityId::Soft,
        name: "Software Licenses",
        description: "Enterprise volume licensing. Shrinkwrap ready.",
        base_price: 25.0,
        volatility: 0.03,
        unlock_threshold: 1000.0,
        trend_min_ticks: 18,
        trend_max_ticks: 50,
        harvest_quantity: 0.08,
    },
    CommodityDef {
        id: CommodityId::Vc,
        name: "Venture Capital",
        description: "Pre-IPO investment securities. Limited availability.",
        base_price: 100.0,
        volatility: 0.035,
        unlock_threshold: 8000.0,
        trend_min_ticks: 40,
        trend_max_ticks: 100,
        harvest_quantity: 0.02,
    },
];

/// Look up the static definition for a commodity.
pub fn commodity_def(id: CommodityId) -> &'static CommodityDef {
    &COMMODITIES[id.index()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defs_indexed_by_id() {
        for id in CommodityId::ALL {
            assert_eq!(commodity_def(id).id, id);
        }
    }

    #[test]
    fn serde_roundtrip_commodity_id() {
        let s = serde_json::to_string(&CommodityId::Email).unwrap();
        let back: CommodityId = serde_json::from_str(&s).unwrap();
        assert_eq!(back, CommodityId::Email);
    }

    #[test]
    fn harvest_value_near_two_dollars() {
        for def in &COMMODITIES {
            let value = def.harvest_quantity * def.base_price;
            assert!((value - 2.0).abs() < 1e-9, "{}", def.name);
        }
    }
}
