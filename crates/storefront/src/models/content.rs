//! Admin-managed home page content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ember_wick_core::{BannerId, TestimonialId};

/// Popup shown over the home page hero (`siteConfig/heroPopup`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeroPopupConfig {
    pub active: bool,
    pub title: String,
    pub subtitle: String,
    pub image_url: String,
    pub button_text: String,
    pub button_link: String,
    /// Seconds after page load before the popup opens.
    pub delay_seconds: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A promotional banner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Banner {
    pub id: BannerId,
    pub title: String,
    pub subtitle: String,
    pub image_url: String,
    pub link: String,
    pub position: i32,
    pub active: bool,
}

/// A customer quote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Testimonial {
    pub id: TestimonialId,
    pub author: String,
    pub quote: String,
    /// Star rating, 1 to 5.
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub position: i32,
    pub active: bool,
}

impl Testimonial {
    pub const MIN_RATING: u8 = 1;
    pub const MAX_RATING: u8 = 5;

    /// Whether the rating is within 1 to 5.
    #[must_use]
    pub const fn has_valid_rating(&self) -> bool {
        self.rating >= Self::MIN_RATING && self.rating <= Self::MAX_RATING
    }
}
