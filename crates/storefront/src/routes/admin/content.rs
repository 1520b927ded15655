//! Ordered content: templates, fonts, banners and testimonials.
//!
//! The four collections share one set of handlers; [`AdminContent`] supplies
//! the per-type label and validation.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use tracing::{info, instrument};

use crate::db::content::{Positioned, all_ordered};
use crate::db::{Repository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::AppJson;
use crate::middleware::RequireAdmin;
use crate::models::{Banner, CandleTemplate, CustomFont, Testimonial};
use crate::state::AppState;

/// Content type editable through the admin API.
pub trait AdminContent: Positioned {
    /// Name used in error messages.
    const LABEL: &'static str;

    fn set_id(&mut self, id: &str);

    /// Carry over fields the client does not own.
    fn keep_from(&mut self, _existing: &Self) {}

    /// Reject a document before it is written.
    fn validate(&self) -> std::result::Result<(), String>;
}

fn required(value: &str, field: &str) -> std::result::Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{field} is required"))
    } else {
        Ok(())
    }
}

impl AdminContent for CandleTemplate {
    const LABEL: &'static str = "Template";

    fn set_id(&mut self, id: &str) {
        self.id = id.into();
    }

    fn keep_from(&mut self, existing: &Self) {
        self.created_at = existing.created_at;
    }

    fn validate(&self) -> std::result::Result<(), String> {
        required(&self.name, "Name")?;
        if self
            .text_areas
            .iter()
            .any(|area| area.width <= 0.0 || area.height <= 0.0)
        {
            return Err("Text areas need a positive width and height".to_string());
        }
        Ok(())
    }
}

impl AdminContent for CustomFont {
    const LABEL: &'static str = "Font";

    fn set_id(&mut self, id: &str) {
        self.id = id.into();
    }

    fn keep_from(&mut self, existing: &Self) {
        self.created_at = existing.created_at;
    }

    fn validate(&self) -> std::result::Result<(), String> {
        required(&self.name, "Name")?;
        required(&self.family, "Font family")?;
        required(&self.url, "Font URL")
    }
}

impl AdminContent for Banner {
    const LABEL: &'static str = "Banner";

    fn set_id(&mut self, id: &str) {
        self.id = id.into();
    }

    fn validate(&self) -> std::result::Result<(), String> {
        required(&self.title, "Title")?;
        required(&self.image_url, "Image URL")
    }
}

impl AdminContent for Testimonial {
    const LABEL: &'static str = "Testimonial";

    fn set_id(&mut self, id: &str) {
        self.id = id.into();
    }

    fn validate(&self) -> std::result::Result<(), String> {
        required(&self.author, "Author")?;
        required(&self.quote, "Quote")?;
        if self.has_valid_rating() {
            Ok(())
        } else {
            Err(format!(
                "Rating must be between {} and {}",
                Self::MIN_RATING,
                Self::MAX_RATING
            ))
        }
    }
}

/// Routes for one content type.
pub fn routes<T: AdminContent>() -> Router<AppState> {
    Router::new()
        .route("/", get(list::<T>).post(create::<T>))
        .route("/{id}", put(update::<T>).delete(remove::<T>))
}

fn not_found<T: AdminContent>(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::NotFound(T::LABEL.to_string()),
        other => other.into(),
    }
}

/// GET: every item, inactive ones included, in display order.
#[instrument(skip_all, fields(collection = T::COLLECTION))]
async fn list<T: AdminContent>(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<T>>> {
    Ok(Json(all_ordered::<T>(state.store()).await?))
}

/// POST: create under a generated ID.
#[instrument(skip_all, fields(collection = T::COLLECTION))]
async fn create<T: AdminContent>(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    AppJson(item): AppJson<T>,
) -> Result<(StatusCode, Json<T>)> {
    item.validate().map_err(AppError::BadRequest)?;
    let item = Repository::<T>::new(state.store()).create(item).await?;

    info!(id = %item.id(), "Content created");
    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT /{id}: replace an existing item.
#[instrument(skip(_admin, state, item), fields(collection = T::COLLECTION))]
async fn update<T: AdminContent>(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(mut item): AppJson<T>,
) -> Result<Json<T>> {
    item.validate().map_err(AppError::BadRequest)?;

    let repo = Repository::<T>::new(state.store());
    let existing = repo
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(T::LABEL.to_string()))?;

    item.set_id(&id);
    item.keep_from(&existing);
    let item = repo.save(item).await.map_err(not_found::<T>)?;

    info!(id = %id, "Content updated");
    Ok(Json(item))
}

/// DELETE /{id}
#[instrument(skip(_admin, state), fields(collection = T::COLLECTION))]
async fn remove<T: AdminContent>(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    Repository::<T>::new(state.store())
        .delete(&id)
        .await
        .map_err(not_found::<T>)?;
    Ok(StatusCode::NO_CONTENT)
}
