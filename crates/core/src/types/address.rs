//! Shipping addresses collected at checkout.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A required address field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AddressField {
    FullName,
    Street,
    City,
    PostalCode,
    Country,
}

impl AddressField {
    /// Field name as sent by the checkout form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FullName => "fullName",
            Self::Street => "street",
            Self::City => "city",
            Self::PostalCode => "postalCode",
            Self::Country => "country",
        }
    }
}

impl fmt::Display for AddressField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address validation failure listing every missing required field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing required address fields: {}", join_fields(.missing))]
pub struct AddressError {
    /// Missing fields in form order.
    pub missing: Vec<AddressField>,
}

fn join_fields(fields: &[AddressField]) -> String {
    fields
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Shipping address attached to an order.
///
/// Persisted with camelCase keys to match existing order documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingAddress {
    pub full_name: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ShippingAddress {
    /// Check that all five required fields contain something other than
    /// whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError`] naming every blank required field.
    pub fn validate(&self) -> Result<(), AddressError> {
        let missing: Vec<AddressField> = [
            (AddressField::FullName, &self.full_name),
            (AddressField::Street, &self.street),
            (AddressField::City, &self.city),
            (AddressField::PostalCode, &self.postal_code),
            (AddressField::Country, &self.country),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AddressError { missing })
        }
    }

    /// Copy with surrounding whitespace stripped from every field.
    #[must_use]
    pub fn trimmed(&self) -> Self {
        Self {
            full_name: self.full_name.trim().to_owned(),
            street: self.street.trim().to_owned(),
            city: self.city.trim().to_owned(),
            postal_code: self.postal_code.trim().to_owned(),
            country: self.country.trim().to_owned(),
            phone: self
                .phone
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_owned),
        }
    }
}
