//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderValue, header::CACHE_CONTROL},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use crate::db::products::{ProductRepository, categories};
use crate::error::{AppError, Result};
use crate::extract::AppQuery;
use crate::models::Product;
use crate::state::AppState;

/// Browsers and CDNs may reuse catalog responses briefly.
const CATALOG_CACHE_CONTROL: &str = "public, max-age=60";

/// Filters for the product list.
#[derive(Debug, Default, Deserialize)]
pub struct ProductFilter {
    pub category: Option<String>,
    /// Case-insensitive text search.
    pub q: Option<String>,
    pub featured: Option<bool>,
}

impl ProductFilter {
    fn keeps(&self, product: &Product) -> bool {
        let text_ok = self
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .is_none_or(|q| product.matches_text(q));
        let featured_ok = self.featured.is_none_or(|f| product.featured == f);
        text_ok && featured_ok
    }
}

fn cacheable(body: impl IntoResponse) -> Response {
    let mut response = body.into_response();
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static(CATALOG_CACHE_CONTROL));
    response
}

/// GET /api/products
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<ProductFilter>,
) -> Result<Response> {
    let products: Vec<Product> = match filter.category.as_deref().map(str::trim) {
        Some(category) if !category.is_empty() => {
            ProductRepository::new(state.store())
                .by_category(category)
                .await?
        }
        _ => state.catalog().products().await?.as_ref().clone(),
    };

    let products: Vec<Product> = products.into_iter().filter(|p| filter.keeps(p)).collect();
    Ok(cacheable(Json(products)))
}

/// GET /api/products/{id}
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response> {
    let product = state
        .catalog()
        .product(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
    Ok(cacheable(Json(product)))
}

/// GET /api/categories
#[instrument(skip(state))]
pub async fn categories_index(State(state): State<AppState>) -> Result<Response> {
    let products = state.catalog().products().await?;
    Ok(cacheable(Json(categories(&products))))
}
