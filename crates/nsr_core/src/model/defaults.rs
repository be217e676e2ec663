//! Default price deck and commercial terms.
//!
//! Used when an [`EvaluationInput`](super::EvaluationInput) leaves an optional
//! term unset. Prices are the January 2026 COMEX deck.

/// Copper price, $/lb
pub const DEFAULT_CU_PRICE_PER_LB: f64 = 6.28;
/// Gold price, $/oz
pub const DEFAULT_AU_PRICE_PER_OZ: f64 = 5360.0;
/// Silver price, $/oz
pub const DEFAULT_AG_PRICE_PER_OZ: f64 = 116.39;

/// Treatment charge, $/dmt concentrate
pub const DEFAULT_CU_TC: f64 = 40.0;
/// Copper refining charge, $/lb payable
pub const DEFAULT_CU_RC: f64 = 1.90;
/// Freight, $/dmt concentrate
pub const DEFAULT_CU_FREIGHT: f64 = 84.0;
/// Penalties, $/dmt concentrate
pub const DEFAULT_CU_PENALTIES: f64 = 0.0;

pub const DEFAULT_MINE_DILUTION: f64 = 0.14;
pub const DEFAULT_ORE_RECOVERY: f64 = 0.98;
pub const DEFAULT_ORE_TONNAGE: f64 = 1000.0;

/// Cost cutoff used when no configuration is supplied, $/t ore
pub const DEFAULT_CUTOFF_COST: f64 = 45.0;
