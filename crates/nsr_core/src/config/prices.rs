//! Metal price deck and the sources that refresh it.

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::PriceError;
use crate::model::MetalPrices;

/// A set of prices as reported by a source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub prices: MetalPrices,
    /// Provider name, e.g. `"static"` or `"metalpriceapi"`
    pub source: String,
    pub is_live: bool,
}

/// Anything that can quote current metal prices.
///
/// Network providers live outside this crate; the deck only needs a quote or
/// an error.
pub trait PriceSource {
    fn fetch(&self) -> Result<PriceQuote, PriceError>;
}

/// Fixed prices, used for offline runs and tests
#[derive(Debug, Clone, PartialEq)]
pub struct StaticPrices {
    pub prices: MetalPrices,
}

impl StaticPrices {
    pub fn new(prices: MetalPrices) -> Self {
        Self { prices }
    }
}

impl Default for StaticPrices {
    fn default() -> Self {
        Self::new(MetalPrices::default())
    }
}

impl PriceSource for StaticPrices {
    fn fetch(&self) -> Result<PriceQuote, PriceError> {
        Ok(PriceQuote {
            prices: self.prices,
            source: "static".to_string(),
            is_live: false,
        })
    }
}

/// Prices every evaluation in a recomputation is run against.
///
/// The deck only changes through [`PriceDeck::refresh`] or [`PriceDeck::set`];
/// a failed refresh leaves the previous prices in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceDeck {
    #[serde(flatten)]
    pub prices: MetalPrices,
    pub source: String,
    pub is_live: bool,
    /// When the prices were last replaced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl Default for PriceDeck {
    fn default() -> Self {
        Self {
            prices: MetalPrices::default(),
            source: "default".to_string(),
            is_live: false,
            updated_at: None,
        }
    }
}

impl PriceDeck {
    #[must_use]
    pub fn prices(&self) -> MetalPrices {
        self.prices
    }

    /// Replace the prices by hand
    pub fn set(&mut self, prices: MetalPrices) -> Result<(), PriceError> {
        validate(&prices)?;
        self.prices = prices;
        self.source = "manual".to_string();
        self.is_live = false;
        self.updated_at = Some(Timestamp::now());
        Ok(())
    }

    /// Pull a quote from `source`. On failure the deck keeps its prices and
    /// the error is returned to the caller.
    pub fn refresh(&mut self, source: &dyn PriceSource) -> Result<(), PriceError> {
        let quote = source.fetch().and_then(|quote| {
            validate(&quote.prices)?;
            Ok(quote)
        });

        match quote {
            Ok(quote) => {
                tracing::info!(
                    source = %quote.source,
                    cu = quote.prices.cu_price,
                    au = quote.prices.au_price,
                    ag = quote.prices.ag_price,
                    "Price deck refreshed"
                );
                self.prices = quote.prices;
                self.source = quote.source;
                self.is_live = quote.is_live;
                self.updated_at = Some(Timestamp::now());
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, source = %self.source, "Price refresh failed, keeping previous prices");
                Err(e)
            }
        }
    }

    /// True when the deck has never been refreshed or is older than `max_age`
    #[must_use]
    pub fn is_stale(&self, now: Timestamp, max_age: SignedDuration) -> bool {
        match self.updated_at {
            Some(updated) => now.duration_since(updated) > max_age,
            None => true,
        }
    }
}

fn validate(prices: &MetalPrices) -> Result<(), PriceError> {
    for (metal, value) in [
        ("copper", prices.cu_price),
        ("gold", prices.au_price),
        ("silver", prices.ag_price),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(PriceError::InvalidPrice { metal, value });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Offline;

    impl PriceSource for Offline {
        fn fetch(&self) -> Result<PriceQuote, PriceError> {
            Err(PriceError::Unavailable("connection refused".to_string()))
        }
    }

    fn prices(cu: f64) -> MetalPrices {
        MetalPrices {
            cu_price: cu,
            ..MetalPrices::default()
        }
    }

    #[test]
    fn test_refresh_replaces_prices() {
        let mut deck = PriceDeck::default();
        deck.refresh(&StaticPrices::new(prices(4.5))).unwrap();

        assert_eq!(deck.prices().cu_price, 4.5);
        assert_eq!(deck.source, "static");
        assert!(deck.updated_at.is_some());
    }

    #[test]
    fn test_failed_refresh_keeps_previous_prices() {
        let mut deck = PriceDeck::default();
        deck.refresh(&StaticPrices::new(prices(4.5))).unwrap();

        let err = deck.refresh(&Offline).unwrap_err();
        assert!(matches!(err, PriceError::Unavailable(_)));
        assert_eq!(deck.prices().cu_price, 4.5);
        assert_eq!(deck.source, "static");
    }

    #[test]
    fn test_invalid_quote_is_rejected() {
        let mut deck = PriceDeck::default();
        let err = deck.refresh(&StaticPrices::new(prices(-1.0))).unwrap_err();
        assert_eq!(
            err,
            PriceError::InvalidPrice {
                metal: "copper",
                value: -1.0
            }
        );
        assert_eq!(deck.prices(), MetalPrices::default());
        assert!(deck.set(prices(f64::NAN)).is_err());
    }

    #[test]
    fn test_staleness() {
        let mut deck = PriceDeck::default();
        let now = Timestamp::now();
        assert!(deck.is_stale(now, SignedDuration::from_hours(1)));

        deck.set(prices(5.0)).unwrap();
        assert!(!deck.is_stale(Timestamp::now(), SignedDuration::from_hours(1)));
        let later = now + SignedDuration::from_hours(2);
        assert!(deck.is_stale(later, SignedDuration::from_hours(1)));
    }
}
