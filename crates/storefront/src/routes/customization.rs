//! Candle customization route handlers.
//!
//! Serves the editor its configuration, templates and fonts, accepts design
//! uploads and answers text-area detection requests.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::multipart::UploadForm;
use crate::db::SingletonRepository;
use crate::db::content::active_ordered;
use crate::error::{AppError, Result};
use crate::extract::{AppJson, AppMultipart};
use crate::models::{CandleTemplate, CustomFont, CustomizationConfig};
use crate::services::{DetectedTextArea, UploadedImage};
use crate::state::AppState;

/// Folder customer designs are stored under.
pub const CUSTOMIZATIONS_FOLDER: &str = "customizations";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectRequest {
    pub image_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectResponse {
    pub text_areas: Vec<DetectedTextArea>,
}

/// GET /api/customization/config
#[instrument(skip(state))]
pub async fn config(State(state): State<AppState>) -> Result<Json<CustomizationConfig>> {
    let config = SingletonRepository::<CustomizationConfig>::new(state.store())
        .load()
        .await?;
    Ok(Json(config))
}

/// GET /api/templates
#[instrument(skip(state))]
pub async fn templates(State(state): State<AppState>) -> Result<Json<Vec<CandleTemplate>>> {
    Ok(Json(active_ordered(state.store()).await?))
}

/// GET /api/fonts
#[instrument(skip(state))]
pub async fn fonts(State(state): State<AppState>) -> Result<Json<Vec<CustomFont>>> {
    Ok(Json(active_ordered(state.store()).await?))
}

/// POST /api/customization/upload
///
/// Multipart body with one image in `file`.
#[instrument(skip(state, multipart))]
pub async fn upload(
    State(state): State<AppState>,
    AppMultipart(multipart): AppMultipart,
) -> Result<Json<UploadedImage>> {
    let config = SingletonRepository::<CustomizationConfig>::new(state.store())
        .load()
        .await?;
    if !config.allow_image_upload {
        return Err(AppError::BadRequest(
            "Image uploads are disabled".to_string(),
        ));
    }

    let file = UploadForm::read(multipart).await?.single_file()?;
    let uploaded = state
        .uploads()
        .upload_image(file, CUSTOMIZATIONS_FOLDER, None)
        .await?;

    info!(path = %uploaded.path, "Design uploaded");
    Ok(Json(uploaded))
}

/// POST /api/customization/detect-text-areas
#[instrument(skip(state, request))]
pub async fn detect_text_areas(
    State(state): State<AppState>,
    AppJson(request): AppJson<DetectRequest>,
) -> Result<Json<DetectResponse>> {
    let image_url = request.image_url.trim();
    if image_url.is_empty() {
        return Err(AppError::BadRequest("imageUrl is required".to_string()));
    }

    Ok(Json(DetectResponse {
        text_areas: state.text_detector().detect(image_url).await,
    }))
}
