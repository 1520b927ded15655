//! Upload service client.
//!
//! Images are stored by a separate upload service in front of object
//! storage. It exposes two endpoints:
//!
//! - `POST {base}/upload` - multipart form with `file`, `folder` and an
//!   optional `fileName`; answers `{"url": ..., "path": ...}`
//! - `DELETE {base}/delete?url=...` - removes a previously uploaded file
//!
//! Failed responses carry `{"error": "..."}`.

use std::time::Duration;

use futures::future::try_join_all;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::StorageConfig;

/// Outbound request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur when talking to the upload service.
#[derive(Debug, Error)]
pub enum StorageError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service rejected the upload.
    #[error("{0}")]
    Upload(String),

    /// The service rejected the delete.
    #[error("Delete failed with status {status}: {message}")]
    Delete { status: u16, message: String },

    /// Folder name contains characters outside `[A-Za-z0-9_/-]`.
    #[error("Invalid folder name: {0}")]
    InvalidFolder(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
    /// Public URL.
    pub url: String,
    /// Path inside the bucket.
    pub path: String,
}

/// A file to upload.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Client for the upload service.
#[derive(Clone)]
pub struct UploadClient {
    client: reqwest::Client,
    base_url: String,
}

impl UploadClient {
    /// Create a new upload client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Upload one image into `folder`.
    ///
    /// `target_name` overrides the stored file name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidFolder` for a bad folder name, and
    /// `StorageError::Upload` with the service's message when it refuses.
    #[instrument(skip(self, file), fields(file_name = %file.file_name, size = file.bytes.len()))]
    pub async fn upload_image(
        &self,
        file: ImageFile,
        folder: &str,
        target_name: Option<&str>,
    ) -> Result<UploadedImage, StorageError> {
        validate_folder(folder)?;

        let part = Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.content_type)?;

        let mut form = Form::new()
            .part("file", part)
            .text("folder", folder.to_string());
        if let Some(name) = target_name {
            form = form.text("fileName", name.to_string());
        }

        let response = self
            .client
            .post(format!("{}/upload", self.base_url))
            .multipart(form)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| format!("Upload failed with status {}", status.as_u16()));
            warn!(status = %status, error = %message, "Upload rejected");
            return Err(StorageError::Upload(message));
        }

        let uploaded: UploadedImage = response
            .json()
            .await
            .map_err(|e| StorageError::Parse(e.to_string()))?;

        info!(path = %uploaded.path, "Image uploaded");
        Ok(uploaded)
    }

    /// Upload several images concurrently.
    ///
    /// Uploads are independent: on failure the files that already landed stay
    /// stored.
    ///
    /// # Errors
    ///
    /// Returns the first failure.
    pub async fn upload_images(
        &self,
        files: Vec<ImageFile>,
        folder: &str,
    ) -> Result<Vec<UploadedImage>, StorageError> {
        validate_folder(folder)?;
        try_join_all(
            files
                .into_iter()
                .map(|file| self.upload_image(file, folder, None)),
        )
        .await
    }

    /// Delete a stored image by its public URL.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Delete` if the service refuses.
    #[instrument(skip(self))]
    pub async fn delete_image(&self, url: &str) -> Result<(), StorageError> {
        let response = self
            .client
            .delete(format!("{}/delete", self.base_url))
            .query(&[("url", url)])
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|body| body.error)
                .unwrap_or(text);
            return Err(StorageError::Delete {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }

    /// Delete a stored image, logging instead of failing.
    pub async fn delete_image_by_url(&self, url: &str) {
        if let Err(e) = self.delete_image(url).await {
            warn!(url = %url, error = %e, "Failed to delete image");
        }
    }
}

/// Check a folder name against `[A-Za-z0-9_/-]+`.
///
/// # Errors
///
/// Returns `StorageError::InvalidFolder` for empty names or other characters.
pub fn validate_folder(folder: &str) -> Result<(), StorageError> {
    let valid = !folder.is_empty()
        && folder
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '/' | '-'));

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidFolder(folder.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::{Multipart, Query},
        http::StatusCode,
        routing::{delete, post},
    };
    use serde_json::{Value, json};
    use std::collections::HashMap;

    async fn serve(router: Router) -> UploadClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        UploadClient::new(&StorageConfig {
            base_url: format!("http://{addr}/"),
        })
        .unwrap()
    }

    fn png(name: &str) -> ImageFile {
        ImageFile {
            bytes: vec![0x89, b'P', b'N', b'G'],
            file_name: name.to_string(),
            content_type: "image/png".to_string(),
        }
    }

    /// Echoes the form back as `{url, path}`; rejects files named `bad.png`.
    async fn upload_handler(mut multipart: Multipart) -> (StatusCode, Json<Value>) {
        let mut fields = HashMap::new();
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let value = match file_name {
                Some(file_name) => file_name,
                None => field.text().await.unwrap(),
            };
            fields.insert(name, value);
        }

        if fields["file"] == "bad.png" {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "File type not allowed"})),
            );
        }

        let stored = fields.get("fileName").unwrap_or(&fields["file"]).clone();
        let path = format!("{}/{stored}", fields["folder"]);
        (
            StatusCode::OK,
            Json(json!({"url": format!("https://cdn.example/{path}"), "path": path})),
        )
    }

    #[tokio::test]
    async fn test_upload_resolves_url_and_path() {
        let client = serve(Router::new().route("/upload", post(upload_handler))).await;

        let uploaded = client
            .upload_image(png("wick.png"), "products", None)
            .await
            .unwrap();
        assert_eq!(uploaded.path, "products/wick.png");
        assert_eq!(uploaded.url, "https://cdn.example/products/wick.png");

        let renamed = client
            .upload_image(png("wick.png"), "customizations/2025", Some("design-1.png"))
            .await
            .unwrap();
        assert_eq!(renamed.path, "customizations/2025/design-1.png");
    }

    #[tokio::test]
    async fn test_upload_rejects_with_server_error() {
        let client = serve(Router::new().route("/upload", post(upload_handler))).await;

        let err = client
            .upload_image(png("bad.png"), "products", None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "File type not allowed");
    }

    #[tokio::test]
    async fn test_upload_falls_back_to_status_message() {
        let client = serve(Router::new().route(
            "/upload",
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        ))
        .await;

        let err = client
            .upload_image(png("wick.png"), "products", None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Upload failed with status 502");
    }

    #[tokio::test]
    async fn test_upload_images_fails_on_first_error() {
        let client = serve(Router::new().route("/upload", post(upload_handler))).await;

        let all = client
            .upload_images(vec![png("a.png"), png("b.png")], "banners")
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let err = client
            .upload_images(vec![png("a.png"), png("bad.png")], "banners")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Upload(_)));
    }

    #[tokio::test]
    async fn test_delete_propagates_and_by_url_swallows() {
        let client = serve(Router::new().route(
            "/delete",
            delete(|Query(params): Query<HashMap<String, String>>| async move {
                if params["url"].ends_with("gone.png") {
                    (StatusCode::NOT_FOUND, Json(json!({"error": "File not found"})))
                } else {
                    (StatusCode::OK, Json(json!({"success": true})))
                }
            }),
        ))
        .await;

        client
            .delete_image("https://cdn.example/products/a.png")
            .await
            .unwrap();

        match client.delete_image("https://cdn.example/gone.png").await {
            Err(StorageError::Delete { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "File not found");
            }
            other => panic!("unexpected result: {other:?}"),
        }

        client
            .delete_image_by_url("https://cdn.example/gone.png")
            .await;
    }

    #[test]
    fn test_validate_folder() {
        assert!(validate_folder("products").is_ok());
        assert!(validate_folder("customizations/user_1-a").is_ok());
        assert!(validate_folder("").is_err());
        assert!(validate_folder("../etc").is_err());
        assert!(validate_folder("a b").is_err());
    }
}
