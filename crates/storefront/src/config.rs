//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `FIRESTORE_PROJECT_ID` - Project that owns the document database
//! - `ADMIN_API_TOKEN` - Bearer token for `/api/admin` (high entropy)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `FIRESTORE_DATABASE` - Database name (default: `(default)`)
//! - `FIRESTORE_BASE_URL` - REST endpoint override, e.g. the local emulator
//! - `FIRESTORE_API_KEY` - Web API key appended to document requests
//! - `FIRESTORE_POLL_INTERVAL_SECS` - Listener polling interval (default: 5)
//! - `STORAGE_SERVICE_URL` - Upload service base URL (default: `http://localhost:3001`)
//! - `IMAGE_PROXY_ALLOWED_DOMAIN` - Domain accepted by `/api/image-proxy`
//! - `B2_PROXY_ALLOWED_DOMAIN` - Domain accepted by `/api/b2-proxy`
//! - `IMAGE_PROXY_CACHE_SECONDS` - `max-age` on proxied images (default: 86400)
//! - `TEXT_DETECTION_DELAY_MS` - Delay before text areas are returned (default: 1500)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const MIN_ADMIN_TOKEN_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Bearer token guarding the admin API
    pub admin_token: SecretString,
    /// Managed document store
    pub firestore: FirestoreConfig,
    /// External upload service
    pub storage: StorageConfig,
    /// Image proxy endpoints
    pub proxy: ProxyConfig,
    /// Delay applied by the text-area detection endpoint
    pub text_detection_delay: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Firestore REST API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct FirestoreConfig {
    /// Project ID
    pub project_id: String,
    /// Database name
    pub database: String,
    /// REST root, without the `/projects/...` suffix
    pub base_url: String,
    /// Web API key
    pub api_key: Option<SecretString>,
    /// How often listeners re-read their collection
    pub poll_interval: Duration,
}

impl std::fmt::Debug for FirestoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreConfig")
            .field("project_id", &self.project_id)
            .field("database", &self.database)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl FirestoreConfig {
    /// Default public REST root.
    pub const DEFAULT_BASE_URL: &'static str = "https://firestore.googleapis.com/v1";

    /// Fully qualified `documents` endpoint for this project and database.
    #[must_use]
    pub fn documents_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/{}/documents",
            self.base_url.trim_end_matches('/'),
            self.project_id,
            self.database
        )
    }
}

/// Upload service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Base URL exposing `POST /upload` and `DELETE /delete`
    pub base_url: String,
}

/// Image proxy configuration.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Domain substring required by `/api/image-proxy`
    pub image_domain: String,
    /// Domain substring required by `/api/b2-proxy`
    pub b2_domain: String,
    /// `Cache-Control: max-age` on proxied responses
    pub cache_seconds: u32,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            image_domain: "firebasestorage.googleapis.com".to_string(),
            b2_domain: "backblazeb2.com".to_string(),
            cache_seconds: 86_400,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env_or_default::<IpAddr>("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        let admin_token = get_validated_secret("ADMIN_API_TOKEN", MIN_ADMIN_TOKEN_LENGTH)?;

        let defaults = ProxyConfig::default();
        let proxy = ProxyConfig {
            image_domain: get_env_or_default("IMAGE_PROXY_ALLOWED_DOMAIN", &defaults.image_domain),
            b2_domain: get_env_or_default("B2_PROXY_ALLOWED_DOMAIN", &defaults.b2_domain),
            cache_seconds: parse_env_or_default("IMAGE_PROXY_CACHE_SECONDS", "86400")?,
        };

        Ok(Self {
            host,
            port,
            base_url,
            admin_token,
            firestore: FirestoreConfig::from_env()?,
            storage: StorageConfig {
                base_url: get_env_or_default("STORAGE_SERVICE_URL", "http://localhost:3001"),
            },
            proxy,
            text_detection_delay: Duration::from_millis(parse_env_or_default(
                "TEXT_DETECTION_DELAY_MS",
                "1500",
            )?),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env_or_default("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl FirestoreConfig {
    /// Load the document store settings on their own.
    ///
    /// Used by the CLI, which has no need for the HTTP server settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the project ID is missing or a number fails
    /// to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            project_id: get_required_env("FIRESTORE_PROJECT_ID")?,
            database: get_env_or_default("FIRESTORE_DATABASE", "(default)"),
            base_url: get_env_or_default("FIRESTORE_BASE_URL", Self::DEFAULT_BASE_URL),
            api_key: get_optional_env("FIRESTORE_API_KEY").map(SecretString::from),
            poll_interval: Duration::from_secs(parse_env_or_default(
                "FIRESTORE_POLL_INTERVAL_SECS",
                "5",
            )?),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Bits of entropy per character, counted over distinct characters.
fn shannon_entropy(s: &str) -> f64 {
    let mut counts: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *counts.entry(c).or_default() += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    let total = counts.values().sum::<usize>() as f64;
    counts
        .values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / total;
            -p * p.log2()
        })
        .sum()
}

/// Reject secrets that are short, look like placeholders, or are too
/// repetitive to be random.
fn check_secret(secret: &str, var_name: &str, min_length: usize) -> Result<(), ConfigError> {
    let insecure = |reason: String| Err(ConfigError::InsecureSecret(var_name.to_string(), reason));

    let length = secret.chars().count();
    if length < min_length {
        return insecure(format!(
            "must be at least {min_length} characters (got {length})"
        ));
    }

    let lower = secret.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return insecure(format!("appears to be a placeholder (contains '{pattern}')"));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return insecure(format!(
            "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
        ));
    }

    Ok(())
}

/// Load a required secret and check its strength.
fn get_validated_secret(key: &str, min_length: usize) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    check_secret(&value, key, min_length)?;
    Ok(SecretString::from(value))
}
