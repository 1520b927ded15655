//! Home page content.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use crate::db::SingletonRepository;
use crate::db::content::active_ordered;
use crate::error::Result;
use crate::models::{Banner, HeroPopupConfig, Product, Testimonial};
use crate::state::AppState;

/// Everything the home page renders.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeContent {
    /// `None` while the popup is switched off.
    pub hero_popup: Option<HeroPopupConfig>,
    pub banners: Vec<Banner>,
    pub testimonials: Vec<Testimonial>,
    pub featured_products: Vec<Product>,
}

/// GET /api/home
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Result<Json<HomeContent>> {
    let store = state.store();
    let hero_popup_repo = SingletonRepository::<HeroPopupConfig>::new(store);
    let (hero_popup, banners, testimonials, featured_products) = tokio::try_join!(
        hero_popup_repo.load(),
        active_ordered::<Banner>(store),
        active_ordered::<Testimonial>(store),
        state.catalog().featured(),
    )?;

    Ok(Json(HomeContent {
        hero_popup: hero_popup.active.then_some(hero_popup),
        banners,
        testimonials,
        featured_products,
    }))
}
