//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with in-memory store, cart only)
//! 5. Security headers (skipped for the image proxies)
//! 6. Rate limiting (governor), per route group
//!
//! Admin routes additionally extract [`RequireAdmin`].

pub mod admin_auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use admin_auth::RequireAdmin;
pub use rate_limit::{api_rate_limiter, strict_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{create_session_layer, session_keys};
