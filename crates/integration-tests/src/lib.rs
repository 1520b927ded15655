//! Integration tests for Ember & Wick.
//!
//! Each test starts the full storefront router on an ephemeral port, backed
//! by the in-memory document store, and talks to it over HTTP with
//! `reqwest`. The client keeps cookies, so one [`TestServer`] behaves like
//! one shopper's browser.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p ember-wick-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `shopping` - Catalog, cart and checkout
//! - `site` - Home content, contact inbox and image proxies
//! - `admin` - Token-guarded management API

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::SocketAddr;
use std::time::Duration;

use ember_wick_storefront::config::{FirestoreConfig, ProxyConfig, StorageConfig, StorefrontConfig};
use ember_wick_storefront::routes;
use ember_wick_storefront::state::AppState;
use ember_wick_storefront::store::{DocumentStore, MemoryStore};
use reqwest::{Client, RequestBuilder, Response};
use secrecy::SecretString;
use serde_json::Value;
use tokio::net::TcpListener;

/// Bearer token accepted by the test server's admin API.
pub const ADMIN_TOKEN: &str = "integration-admin-token-9f3c1a7e5b2d4c6f";

/// Configuration with no real upstreams. Tests adjust fields before
/// calling [`TestServer::start_with`].
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: "http://127.0.0.1".to_string(),
        admin_token: SecretString::from(ADMIN_TOKEN),
        firestore: FirestoreConfig {
            project_id: "integration".to_string(),
            database: "(default)".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: None,
            poll_interval: Duration::from_millis(50),
        },
        storage: StorageConfig {
            base_url: "http://127.0.0.1:9".to_string(),
        },
        proxy: ProxyConfig::default(),
        text_detection_delay: Duration::ZERO,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// A running storefront and a cookie-keeping client pointed at it.
pub struct TestServer {
    pub base_url: String,
    pub client: Client,
    pub state: AppState,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(test_config()).await
    }

    pub async fn start_with(config: StorefrontConfig) -> Self {
        let state = AppState::new(config, DocumentStore::Memory(MemoryStore::new())).unwrap();
        let app = routes::app(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });

        let client = Client::builder().cookie_store(true).build().unwrap();
        Self {
            base_url: format!("http://{addr}"),
            client,
            state,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    #[must_use]
    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    #[must_use]
    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    /// Request with the admin bearer token attached.
    #[must_use]
    pub fn admin(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .bearer_auth(ADMIN_TOKEN)
    }

    /// Create a product through the admin API and return its JSON.
    pub async fn create_product(&self, product: Value) -> Value {
        let response = self
            .admin(reqwest::Method::POST, "/api/admin/products")
            .json(&product)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        response.json().await.unwrap()
    }
}

/// Status and JSON body of a response.
pub async fn json_of(response: Response) -> (reqwest::StatusCode, Value) {
    let status = response.status();
    (status, response.json().await.unwrap())
}
