//! Catalog products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ember_wick_core::ProductId;

/// A candle in the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Base price before any size modifier.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Image URLs, first one is the cover.
    pub images: Vec<String>,
    pub category: String,
    pub stock: u32,
    pub featured: bool,
    /// Whether the product accepts a [`ember_wick_core::CandleCustomization`].
    pub customizable: bool,
    pub customization_options: CustomizationOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Per-product customization choices shown on the product page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomizationOptions {
    pub scents: Vec<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
}

impl Product {
    /// Cover image, if any.
    #[must_use]
    pub fn cover_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Whether `quantity` units can be sold.
    #[must_use]
    pub fn has_stock_for(&self, quantity: u64) -> bool {
        quantity <= u64::from(self.stock)
    }

    /// Case-insensitive substring match on name, description and category.
    #[must_use]
    pub fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        [&self.name, &self.description, &self.category]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}
