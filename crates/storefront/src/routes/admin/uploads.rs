//! Generic image upload and delete.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::post,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::extract::{AppMultipart, AppQuery};
use crate::middleware::RequireAdmin;
use crate::routes::multipart::{MULTI_UPLOAD_BODY_LIMIT, UploadForm};
use crate::services::UploadedImage;
use crate::state::AppState;

/// Folder used when the form does not name one.
const DEFAULT_FOLDER: &str = "uploads";

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/",
        post(upload)
            .delete(remove)
            .layer(DefaultBodyLimit::max(MULTI_UPLOAD_BODY_LIMIT)),
    )
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    images: Vec<UploadedImage>,
}

#[derive(Debug, Deserialize)]
struct DeleteParams {
    url: Option<String>,
}

/// POST /api/admin/uploads
///
/// Multipart body: image files plus an optional `folder` field.
#[instrument(skip_all)]
async fn upload(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    AppMultipart(multipart): AppMultipart,
) -> Result<Json<UploadResponse>> {
    let form = UploadForm::read(multipart).await?;
    if form.files.is_empty() {
        return Err(AppError::BadRequest("No file provided".to_string()));
    }

    let folder = form
        .fields
        .get("folder")
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .unwrap_or(DEFAULT_FOLDER)
        .to_string();

    let images = state.uploads().upload_images(form.files, &folder).await?;
    Ok(Json(UploadResponse { images }))
}

/// DELETE /api/admin/uploads?url=
#[instrument(skip(_admin, state))]
async fn remove(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<DeleteParams>,
) -> Result<StatusCode> {
    let url = params
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("URL parameter is required".to_string()))?;

    state.uploads().delete_image(&url).await?;
    Ok(StatusCode::NO_CONTENT)
}
