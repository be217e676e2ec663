//! Economic configuration shared by every stage of a recomputation.

mod prices;

pub use prices::*;

use serde::{Deserialize, Serialize};

use crate::classify::ViabilityThresholds;
use crate::error::ConfigError;
use crate::model::defaults::DEFAULT_CUTOFF_COST;
use crate::projection::PaletteThresholds;

/// Cutoff, prices and classification thresholds.
///
/// Every field has a default, so a partial YAML document such as
/// `cutoff: 52.0` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomicConfig {
    /// Cutoff cost, $/t
    pub cutoff: f64,
    pub prices: PriceDeck,
    pub thresholds: ViabilityThresholds,
    pub palette: PaletteThresholds,
}

impl Default for EconomicConfig {
    fn default() -> Self {
        Self {
            cutoff: DEFAULT_CUTOFF_COST,
            prices: PriceDeck::default(),
            thresholds: ViabilityThresholds::default(),
            palette: PaletteThresholds::default(),
        }
    }
}

impl EconomicConfig {
    #[must_use]
    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = cutoff;
        self
    }

    /// Check values that would make classification meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.cutoff.is_finite() || self.cutoff < 0.0 {
            return Err(ConfigError::InvalidCutoff(self.cutoff));
        }
        let multiplier = self.thresholds.marginal_multiplier;
        if multiplier.is_nan() || multiplier < 1.0 {
            return Err(ConfigError::InvalidMultiplier(multiplier));
        }
        let p = &self.palette;
        let ordered =
            p.deficit <= p.near_cutoff && p.near_cutoff <= p.marginal && p.marginal <= p.profitable;
        if !ordered {
            return Err(ConfigError::UnorderedPalette);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EconomicConfig::default();
        assert_eq!(config.cutoff, 45.0);
        assert_eq!(config.thresholds.marginal_multiplier, 1.1);
        assert_eq!(config.palette.profitable, 1.5);
        assert_eq!(config.prices.prices().cu_price, 6.28);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let config: EconomicConfig =
            serde_json::from_str(r#"{ "cutoff": 52.0, "prices": { "cu_price": 4.1 } }"#).unwrap();
        assert_eq!(config.cutoff, 52.0);
        assert_eq!(config.prices.prices().cu_price, 4.1);
        assert_eq!(config.prices.prices().au_price, 5360.0);
        assert_eq!(config.thresholds, ViabilityThresholds::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert_eq!(
            EconomicConfig::default().with_cutoff(-1.0).validate(),
            Err(ConfigError::InvalidCutoff(-1.0))
        );

        let mut config = EconomicConfig::default();
        config.palette.marginal = 2.0;
        assert_eq!(config.validate(), Err(ConfigError::UnorderedPalette));
    }
}
