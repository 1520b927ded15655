//! Multipart form reading for image uploads.

use std::collections::HashMap;

use axum::extract::Multipart;

use crate::error::{AppError, Result};
use crate::services::ImageFile;

/// Largest single image accepted (10 MiB).
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Request body limit for single-image endpoints, leaving room for the
/// multipart framing.
pub const SINGLE_UPLOAD_BODY_LIMIT: usize = MAX_IMAGE_BYTES + 1024 * 1024;

/// Request body limit for endpoints taking several images.
pub const MULTI_UPLOAD_BODY_LIMIT: usize = 5 * MAX_IMAGE_BYTES;

/// Files and text fields of an upload form.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub files: Vec<ImageFile>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    /// Read every part. Parts with a file name are files and must be images
    /// no larger than [`MAX_IMAGE_BYTES`]; the rest are text fields.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for malformed bodies, non-image files
    /// and oversized files.
    pub async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();

            let Some(file_name) = field.file_name().map(str::to_string) else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                form.fields.insert(name, value);
                continue;
            };

            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            if !content_type.starts_with("image/") {
                return Err(AppError::BadRequest("Only image files are allowed".to_string()));
            }

            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            if bytes.len() > MAX_IMAGE_BYTES {
                return Err(AppError::BadRequest(
                    "Image must be 10 MB or smaller".to_string(),
                ));
            }

            form.files.push(ImageFile {
                bytes: bytes.to_vec(),
                file_name,
                content_type,
            });
        }

        Ok(form)
    }

    /// The single file of a one-image form.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` when no file was sent.
    pub fn single_file(mut self) -> Result<ImageFile> {
        if self.files.is_empty() {
            return Err(AppError::BadRequest("No file provided".to_string()));
        }
        Ok(self.files.swap_remove(0))
    }
}
