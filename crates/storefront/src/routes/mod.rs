//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness
//! GET  /health/ready                   - Readiness (document store answers)
//!
//! # Catalog
//! GET  /api/products                   - List (?category=&q=&featured=)
//! GET  /api/products/{id}              - Product detail
//! GET  /api/categories                 - Distinct categories
//!
//! # Cart (session)
//! GET  /api/cart                       - Cart with count and subtotal
//! POST /api/cart/add                   - Add a line, merging identical ones
//! POST /api/cart/update                - Set quantity (0 removes)
//! POST /api/cart/remove                - Remove a line
//! POST /api/cart/clear                 - Empty the cart
//! GET  /api/cart/count                 - Unit count
//!
//! # Checkout
//! POST /api/checkout                   - Create an order from the cart
//! GET  /api/orders/{id}                - Order lookup
//!
//! # Customization
//! GET  /api/customization/config       - Allowed scents, sizes, colors
//! GET  /api/templates                  - Active templates
//! GET  /api/fonts                      - Active fonts
//! POST /api/customization/upload       - Upload a design image
//! POST /api/customization/detect-text-areas
//!
//! # Site content
//! GET  /api/home                       - Hero popup, banners, testimonials, featured
//! POST /api/contact                    - Contact form
//!
//! # Image proxies (no security headers, permissive CORS)
//! GET|OPTIONS /api/image-proxy?url=
//! GET|OPTIONS /api/b2-proxy?url=
//!
//! # Admin (bearer token)
//! /api/admin/...                       - See [`admin`]
//! ```

pub mod admin;
pub mod cart;
pub mod checkout;
pub mod contact;
pub mod customization;
pub mod health;
pub mod home;
pub mod multipart;
pub mod products;
pub mod proxy;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::Request,
    middleware::from_fn,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::middleware::{
    api_rate_limiter, create_session_layer, request_id_middleware, security_headers_middleware,
    strict_rate_limiter,
};
use crate::state::AppState;

/// Create the catalog routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/{id}", get(products::show))
        .route("/categories", get(products::categories_index))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the customization routes router, minus the upload.
pub fn customization_routes() -> Router<AppState> {
    Router::new()
        .route("/customization/config", get(customization::config))
        .route(
            "/customization/detect-text-areas",
            post(customization::detect_text_areas),
        )
        .route("/templates", get(customization::templates))
        .route("/fonts", get(customization::fonts))
}

/// Create the image proxy routes router.
pub fn proxy_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/image-proxy",
            get(proxy::image_proxy).options(proxy::preflight),
        )
        .route("/b2-proxy", get(proxy::b2_proxy).options(proxy::preflight))
}

/// Endpoints that write on behalf of anonymous visitors.
fn strict_routes() -> Router<AppState> {
    Router::new()
        .route("/contact", post(contact::submit))
        .route(
            "/customization/upload",
            post(customization::upload)
                .layer(DefaultBodyLimit::max(multipart::SINGLE_UPLOAD_BODY_LIMIT)),
        )
        .layer(strict_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .merge(product_routes())
        .nest("/cart", cart_routes())
        .route("/checkout", post(checkout::checkout))
        .route("/orders/{id}", get(checkout::show_order))
        .merge(customization_routes())
        .route("/home", get(home::home))
        .merge(proxy_routes())
        .nest("/admin", admin::routes())
        .layer(api_rate_limiter())
        .merge(strict_routes());

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api)
}

/// The whole application: routes, session, security headers, request IDs
/// and request tracing, bound to `state`.
///
/// Rate limiters key on the client IP, so the server must be run with
/// `into_make_service_with_connect_info::<SocketAddr>()` unless a proxy sets
/// a client IP header.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    Router::new()
        .merge(routes())
        .layer(session_layer)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}
