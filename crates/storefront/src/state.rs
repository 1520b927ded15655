//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::config::StorefrontConfig;
use crate::services::{Catalog, StorageError, TextDetector, UploadClient};
use crate::store::DocumentStore;

/// Outbound request timeout for the image proxies.
const PROXY_TIMEOUT: Duration = Duration::from_secs(30);

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the document store and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    store: DocumentStore,
    catalog: Catalog,
    uploads: UploadClient,
    text_detector: TextDetector,
    http: reqwest::Client,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client fails to build.
    pub fn new(config: StorefrontConfig, store: DocumentStore) -> Result<Self, StorageError> {
        let uploads = UploadClient::new(&config.storage)?;
        let http = reqwest::Client::builder().timeout(PROXY_TIMEOUT).build()?;
        let catalog = Catalog::new(store.clone());
        let text_detector = TextDetector::new(config.text_detection_delay);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                catalog,
                uploads,
                text_detector,
                http,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the document store.
    #[must_use]
    pub fn store(&self) -> &DocumentStore {
        &self.inner.store
    }

    /// Get a reference to the cached catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Get a reference to the upload service client.
    #[must_use]
    pub fn uploads(&self) -> &UploadClient {
        &self.inner.uploads
    }

    /// Get a reference to the text-area detector.
    #[must_use]
    pub fn text_detector(&self) -> &TextDetector {
        &self.inner.text_detector
    }

    /// Get a reference to the HTTP client used by the image proxies.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }
}
