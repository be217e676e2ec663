use serde::{Deserialize, Serialize};

use super::defaults::{DEFAULT_AG_PRICE_PER_OZ, DEFAULT_AU_PRICE_PER_OZ, DEFAULT_CU_PRICE_PER_LB};

/// Metal prices used for one evaluation pass; missing entries fall back to
/// the default deck
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetalPrices {
    /// $/lb
    pub cu_price: f64,
    /// $/oz
    pub au_price: f64,
    /// $/oz
    pub ag_price: f64,
}

impl Default for MetalPrices {
    fn default() -> Self {
        Self {
            cu_price: DEFAULT_CU_PRICE_PER_LB,
            au_price: DEFAULT_AU_PRICE_PER_OZ,
            ag_price: DEFAULT_AG_PRICE_PER_OZ,
        }
    }
}
