//! Text-area detection for uploaded designs.
//!
//! There is no image analysis behind this: after a fixed delay it answers
//! with the same three regions (title, subtitle, footer) that fit the
//! standard label layout. The delay keeps the editor's loading state honest.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::models::TextArea;

/// A region where text could go, with how sure the detector is.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedTextArea {
    #[serde(flatten)]
    pub area: TextArea,
    pub confidence: f64,
}

/// Fixed-response detector.
#[derive(Debug, Clone)]
pub struct TextDetector {
    delay: Duration,
}

impl TextDetector {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Wait out the delay, then return the standard label regions.
    #[instrument(skip(self))]
    pub async fn detect(&self, image_url: &str) -> Vec<DetectedTextArea> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        debug!("Returning standard label regions");
        standard_areas()
    }
}

fn area(id: &str, label: &str, y: f64, height: f64, font_size: f64, confidence: f64) -> DetectedTextArea {
    DetectedTextArea {
        area: TextArea {
            id: id.to_string(),
            x: 50.0,
            y,
            width: 300.0,
            height,
            label: Some(label.to_string()),
            font_size: Some(font_size),
            max_chars: None,
        },
        confidence,
    }
}

fn standard_areas() -> Vec<DetectedTextArea> {
    vec![
        area("title", "Title", 50.0, 60.0, 32.0, 0.95),
        area("subtitle", "Subtitle", 130.0, 40.0, 20.0, 0.87),
        area("footer", "Footer", 320.0, 30.0, 14.0, 0.78),
    ]
}
