//! Candle personalization choices attached to a cart line.

use serde::{Deserialize, Serialize};

/// User-selected candle attributes.
///
/// Every attribute is optional; an empty customization is treated the same
/// as none at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CandleCustomization {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Text printed on the label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Uploaded design image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub design_image_url: Option<String>,
    /// Template the design was started from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
}

impl CandleCustomization {
    /// Drop blank values and trim the rest.
    #[must_use]
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        }

        Self {
            scent: clean(self.scent),
            size: clean(self.size),
            color: clean(self.color),
            message: clean(self.message),
            design_image_url: clean(self.design_image_url),
            template_id: clean(self.template_id),
        }
    }

    /// Whether no attribute is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.scent.is_none()
            && self.size.is_none()
            && self.color.is_none()
            && self.message.is_none()
            && self.design_image_url.is_none()
            && self.template_id.is_none()
    }
}
