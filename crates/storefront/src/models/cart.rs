//! Session cart.
//!
//! The cart is never written to the document store. It is serialized into the
//! visitor's session and priced again from the catalog at checkout.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ember_wick_core::{CandleCustomization, CurrencyCode, Price, ProductId};

/// Line in the cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CartItem {
    /// Derived from the product and its customization.
    pub line_id: String,
    pub product_id: ProductId,
    pub name: String,
    /// Product price plus the size modifier at the time it was added.
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "CandleCustomization::is_empty")]
    pub customization: CandleCustomization,
}

impl CartItem {
    /// Price of the whole line.
    #[must_use]
    pub fn line_total(&self, currency: CurrencyCode) -> Price {
        Price::new(self.unit_price, currency).times(self.quantity)
    }
}

/// Cart contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cart {
    pub items: Vec<CartItem>,
}

/// Line identifier for a product with a customization.
///
/// Uncustomized lines use the bare product ID so that adding the same
/// product twice merges. Customized lines append a name-based UUID of the
/// customization's JSON, so the same choices give the same ID everywhere.
#[must_use]
pub fn line_id(product_id: &ProductId, customization: &CandleCustomization) -> String {
    if customization.is_empty() {
        return product_id.to_string();
    }

    let encoded = serde_json::to_vec(customization).unwrap_or_default();
    let digest = Uuid::new_v5(&Uuid::NAMESPACE_OID, &encoded);
    format!("{product_id}-{}", digest.simple())
}

impl Cart {
    /// Add a line, merging quantities with an identical existing line.
    ///
    /// Returns the resulting line.
    pub fn add(&mut self, mut item: CartItem) -> &CartItem {
        item.customization = item.customization.normalized();
        item.line_id = line_id(&item.product_id, &item.customization);

        let index = match self.items.iter().position(|i| i.line_id == item.line_id) {
            Some(index) => {
                let existing = &mut self.items[index];
                existing.quantity = existing.quantity.saturating_add(item.quantity);
                existing.unit_price = item.unit_price;
                existing.name = item.name;
                existing.image = item.image;
                index
            }
            None => {
                self.items.push(item);
                self.items.len() - 1
            }
        };

        &self.items[index]
    }

    /// Set the quantity of a line. Zero removes it.
    ///
    /// Returns `false` if no line has that ID.
    pub fn update_quantity(&mut self, line_id: &str, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(line_id);
        }

        match self.items.iter_mut().find(|i| i.line_id == line_id) {
            Some(item) => {
                item.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Remove a line. Returns `false` if no line has that ID.
    pub fn remove(&mut self, line_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.line_id != line_id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, i| acc.saturating_add(i.quantity))
    }

    /// Units of one product across all of its lines.
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> u64 {
        self.items
            .iter()
            .filter(|i| &i.product_id == product_id)
            .map(|i| u64::from(i.quantity))
            .sum()
    }

    /// Sum of line totals at the prices captured when items were added.
    #[must_use]
    pub fn subtotal(&self, currency: CurrencyCode) -> Price {
        self.items
            .iter()
            .fold(Price::zero(currency), |acc, i| acc.plus(i.line_total(currency)))
    }
}
