// =============================================================================
// Price Sync - external live quote delivered by a price-feed collaborator
// =============================================================================

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// A self-contained live quote.  Only `price` drives the engine; the 24h
/// fields are passed through for the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivePrice {
    pub price: f64,
    #[serde(default)]
    pub change_24h: String,
    #[serde(default)]
    pub high_24h: f64,
    #[serde(default)]
    pub low_24h: f64,
    #[serde(default)]
    pub last_update: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl LivePrice {
    /// Bare quote with no 24h context.
    pub fn at(price: f64) -> Self {
        Self {
            price,
            change_24h: String::new(),
            high_24h: 0.0,
            low_24h: 0.0,
            last_update: chrono::Utc::now().to_rfc3339(),
            source: None,
        }
    }

    /// Reject quotes that cannot be applied to a candle.
    pub fn validate(&self) -> Result<()> {
        if !self.price.is_finite() || self.price <= 0.0 {
            bail!("live price must be a positive finite number, got {}", self.price);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_payload_deserialises() {
        let quote: LivePrice = serde_json::from_str(r#"{ "price": 2512.4 }"#).unwrap();
        assert!((quote.price - 2512.4).abs() < f64::EPSILON);
        assert!(quote.source.is_none());
        assert!(quote.validate().is_ok());
    }

    #[test]
    fn invalid_prices_rejected() {
        assert!(LivePrice::at(0.0).validate().is_err());
        assert!(LivePrice::at(-5.0).validate().is_err());
        assert!(LivePrice::at(f64::INFINITY).validate().is_err());
    }
}
