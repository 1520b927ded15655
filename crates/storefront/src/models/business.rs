//! Business settings (`siteConfig/business`).

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use ember_wick_core::{CurrencyCode, Price};

/// Store-wide business settings.
///
/// The document is owned by the admin UI and may carry keys this server does
/// not know about; those are kept in `extra` and written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BusinessConfig {
    pub name: String,
    pub contact_email: String,
    pub phone: String,
    pub address: String,
    /// Network name to profile URL.
    pub social_links: BTreeMap<String, String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub shipping_flat_rate: Decimal,
    /// Orders at or above this subtotal ship free. `None` disables it.
    #[serde(with = "rust_decimal::serde::float_option")]
    pub free_shipping_threshold: Option<Decimal>,
    pub currency: CurrencyCode,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            name: "Ember & Wick".to_string(),
            contact_email: String::new(),
            phone: String::new(),
            address: String::new(),
            social_links: BTreeMap::new(),
            shipping_flat_rate: Decimal::new(599, 2),
            free_shipping_threshold: Some(Decimal::from(75)),
            currency: CurrencyCode::default(),
            extra: Map::new(),
        }
    }
}

impl BusinessConfig {
    /// Shipping charged on an order with this subtotal.
    #[must_use]
    pub fn shipping_for(&self, subtotal: Price) -> Price {
        let free = self
            .free_shipping_threshold
            .is_some_and(|threshold| subtotal.amount >= threshold);

        if free || subtotal.amount <= Decimal::ZERO {
            Price::zero(self.currency)
        } else {
            Price::new(self.shipping_flat_rate, self.currency)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shipping_threshold() {
        let config = BusinessConfig::default();
        let usd = |cents| Price::from_cents(cents, CurrencyCode::USD);

        assert_eq!(config.shipping_for(usd(2000)).amount, Decimal::new(599, 2));
        assert_eq!(config.shipping_for(usd(7500)).amount, Decimal::ZERO);
        assert_eq!(config.shipping_for(usd(0)).amount, Decimal::ZERO);
    }

    #[test]
    fn test_no_threshold_always_charges() {
        let config = BusinessConfig {
            free_shipping_threshold: None,
            ..BusinessConfig::default()
        };
        let big = Price::from_cents(1_000_000, CurrencyCode::USD);
        assert_eq!(config.shipping_for(big).amount, Decimal::new(599, 2));
    }

    #[test]
    fn test_unknown_keys_survive() {
        let config: BusinessConfig = serde_json::from_value(json!({
            "name": "Ember & Wick",
            "shippingFlatRate": 6.5,
            "instagramHandle": "@emberandwick"
        }))
        .unwrap();

        assert_eq!(config.extra["instagramHandle"], "@emberandwick");
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["instagramHandle"], "@emberandwick");
        assert_eq!(value["shippingFlatRate"], json!(6.5));
    }
}
