//! Admin API, nested under `/api/admin`.
//!
//! Every handler extracts [`RequireAdmin`](crate::middleware::RequireAdmin),
//! so requests without the bearer token never reach the store.
//!
//! # Routes
//!
//! - `/products` - catalog CRUD and product images
//! - `/orders` - order list and status changes
//! - `/messages` - contact inbox and its live stream
//! - `/templates`, `/fonts`, `/banners`, `/testimonials` - ordered content
//! - `/settings/{hero-popup,customization,business}` - singleton settings
//! - `/uploads` - generic image upload and delete

mod content;
mod messages;
mod orders;
mod products;
mod settings;
mod uploads;

use axum::Router;

use crate::models::{Banner, BusinessConfig, CandleTemplate, CustomFont, CustomizationConfig, HeroPopupConfig, Testimonial};
use crate::state::AppState;

/// Build the admin router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/products", products::routes())
        .nest("/orders", orders::routes())
        .nest("/messages", messages::routes())
        .nest("/templates", content::routes::<CandleTemplate>())
        .nest("/fonts", content::routes::<CustomFont>())
        .nest("/banners", content::routes::<Banner>())
        .nest("/testimonials", content::routes::<Testimonial>())
        .nest("/settings/hero-popup", settings::routes::<HeroPopupConfig>())
        .nest("/settings/customization", settings::routes::<CustomizationConfig>())
        .nest("/settings/business", settings::routes::<BusinessConfig>())
        .nest("/uploads", uploads::routes())
}
