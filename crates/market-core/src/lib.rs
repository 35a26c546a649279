#![deny(warnings)]

//! Static definition tables and balance constants for the market engine.
//!
//! This crate carries the immutable game-balance data (commodities,
//! factories, upgrades, influences, employee archetypes, market events,
//! credit-rating tables) plus validation helpers that guarantee the tables
//! are internally consistent before a simulation starts.

pub mod commodities;
pub mod constants;
pub mod credit;
pub mod employees;
pub mod events;
pub mod factories;
pub mod influences;
pub mod upgrades;

pub use commodities::{commodity_def, CommodityDef, CommodityId, COMMODITIES};
pub use credit::CreditRating;
pub use employees::{employee_def, BonusKind, EmployeeDef, EmployeeType};
pub use events::{EventEffect, MarketEventDef, MARKET_EVENTS};
pub use factories::{factory_def, ConversionInput, FactoryDef, FactoryId, FACTORIES};
pub use influences::{influence_def, InfluenceDef, InfluenceId, INFLUENCES};
pub use upgrades::{
    harvest_upgrade, upgrade_def, UpgradeCategory, UpgradeDef, UpgradeId, UPGRADES,
};

use thiserror::Error;

/// Validation errors for the static tables.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A commodity carries a non-positive base price.
    #[error("commodity {0} has a non-positive base price")]
    NonPositiveBasePrice(&'static str),
    /// A trend window is empty or inverted.
    #[error("commodity {0} has an invalid trend window")]
    InvalidTrendWindow(&'static str),
    /// A factory's output range is inverted.
    #[error("factory {0} has min output above max output")]
    InvalidOutputRange(&'static str),
    /// A conversion input does not consume a cheaper commodity.
    #[error("factory {0} converts from a non-cheaper commodity")]
    InvalidConversionTier(&'static str),
    /// A price-moving event has an out-of-range magnitude.
    #[error("event magnitude out of (0,1): {0}")]
    InvalidEventMagnitude(&'static str),
    /// The upgrade catalog is not in variant order.
    #[error("upgrade out of variant order: {0}")]
    MisorderedUpgrade(&'static str),
}

/// Validate cross-references and orderings across all static tables.
///
/// Cheap enough to run at startup; the engine assumes these invariants.
pub fn validate_tables() -> Result<(), ValidationError> {
    for c in &COMMODITIES {
        if c.base_price <= 0.0 {
            return Err(ValidationError::NonPositiveBasePrice(c.name));
        }
        if c.trend_min_ticks == 0 || c.trend_min_ticks > c.trend_max_ticks {
            return Err(ValidationError::InvalidTrendWindow(c.name));
        }
    }

    for f in &FACTORIES {
        if f.min_output > f.max_output {
            return Err(ValidationError::InvalidOutputRange(f.name));
        }
        if let Some(input) = f.conversion_input {
            let in_price = commodity_def(input.commodity).base_price;
            let out_price = commodity_def(f.produces).base_price;
            if in_price >= out_price {
                return Err(ValidationError::InvalidConversionTier(f.name));
            }
        }
    }

    // The indexed lookups require the catalog to mirror the enum order.
    for (i, u) in UPGRADES.iter().enumerate() {
        if u.id as usize != i {
            return Err(ValidationError::MisorderedUpgrade(u.name));
        }
    }

    for e in MARKET_EVENTS {
        if e.effect.moves_price() && !(e.magnitude > 0.0 && e.magnitude < 1.0) {
            return Err(ValidationError::InvalidEventMagnitude(e.text));
        }
    }

    Ok(())
}
