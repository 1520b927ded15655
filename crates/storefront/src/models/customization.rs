//! Candle personalization: templates, fonts and the site-wide option lists.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ember_wick_core::{CandleCustomization, FontId, TemplateId};

/// Default label message limit when the config document does not set one.
pub const DEFAULT_MAX_MESSAGE_LENGTH: u32 = 100;

/// A starting design customers can personalize.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CandleTemplate {
    pub id: TemplateId,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub category: String,
    /// Regions of the template where text can be placed.
    pub text_areas: Vec<TextArea>,
    pub active: bool,
    pub position: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Rectangle on a design image, in pixels from the top-left corner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextArea {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_chars: Option<u32>,
}

/// A web font offered in the design editor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomFont {
    pub id: FontId,
    pub name: String,
    /// CSS `font-family` value.
    pub family: String,
    /// Stylesheet or font file URL.
    pub url: String,
    pub active: bool,
    pub position: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A size choice and what it adds to the base price.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SizeOption {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_modifier: Decimal,
}

/// Site-wide customization settings (`siteConfig/customization`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomizationConfig {
    pub scents: Vec<String>,
    pub sizes: Vec<SizeOption>,
    pub colors: Vec<String>,
    pub max_message_length: u32,
    pub allow_image_upload: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for CustomizationConfig {
    fn default() -> Self {
        Self {
            scents: Vec::new(),
            sizes: Vec::new(),
            colors: Vec::new(),
            max_message_length: DEFAULT_MAX_MESSAGE_LENGTH,
            allow_image_upload: true,
            updated_at: None,
        }
    }
}

/// A customization that the current config does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustomizationError {
    #[error("Unknown scent: {0}")]
    UnknownScent(String),

    #[error("Unknown size: {0}")]
    UnknownSize(String),

    #[error("Unknown color: {0}")]
    UnknownColor(String),

    #[error("Message is longer than {max} characters")]
    MessageTooLong { max: u32 },
}

impl CustomizationConfig {
    /// Price added by the given size, zero when unset or unknown.
    #[must_use]
    pub fn size_modifier(&self, size: Option<&str>) -> Decimal {
        size.and_then(|name| self.sizes.iter().find(|s| s.name == name))
            .map_or(Decimal::ZERO, |s| s.price_modifier)
    }

    /// Check a customization against the configured choices.
    ///
    /// An empty list accepts any value for that attribute.
    ///
    /// # Errors
    ///
    /// Returns the first attribute that is not allowed.
    pub fn validate(&self, customization: &CandleCustomization) -> Result<(), CustomizationError> {
        if let Some(scent) = &customization.scent
            && !self.scents.is_empty()
            && !self.scents.contains(scent)
        {
            return Err(CustomizationError::UnknownScent(scent.clone()));
        }

        if let Some(size) = &customization.size
            && !self.sizes.is_empty()
            && !self.sizes.iter().any(|s| &s.name == size)
        {
            return Err(CustomizationError::UnknownSize(size.clone()));
        }

        if let Some(color) = &customization.color
            && !self.colors.is_empty()
            && !self.colors.contains(color)
        {
            return Err(CustomizationError::UnknownColor(color.clone()));
        }

        if let Some(message) = &customization.message {
            let length = message.chars().count();
            if !u32::try_from(length).is_ok_and(|len| len <= self.max_message_length) {
                return Err(CustomizationError::MessageTooLong {
                    max: self.max_message_length,
                });
            }
        }

        Ok(())
    }
}
