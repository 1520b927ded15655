//! Catalog management.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    routing::{get, post},
};
use futures::future::join_all;
use rust_decimal::Decimal;
use tracing::{info, instrument};

use ember_wick_core::ProductId;

use crate::db::Repository;
use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::extract::{AppJson, AppMultipart};
use crate::middleware::RequireAdmin;
use crate::models::Product;
use crate::routes::multipart::{MULTI_UPLOAD_BODY_LIMIT, UploadForm};
use crate::state::AppState;

/// Folder product images are stored under.
const PRODUCTS_FOLDER: &str = "products";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).put(update).delete(remove))
        .route(
            "/{id}/images",
            post(upload_images).layer(DefaultBodyLimit::max(MULTI_UPLOAD_BODY_LIMIT)),
        )
}

fn validate(product: &Product) -> Result<()> {
    if product.name.trim().is_empty() {
        return Err(AppError::BadRequest("Product name is required".to_string()));
    }
    if product.price < Decimal::ZERO {
        return Err(AppError::BadRequest("Price cannot be negative".to_string()));
    }
    Ok(())
}

async fn find(state: &AppState, id: &str) -> Result<Product> {
    Repository::<Product>::new(state.store())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
}

/// GET /api/admin/products
#[instrument(skip_all)]
async fn list(_admin: RequireAdmin, State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(ProductRepository::new(state.store()).all().await?))
}

/// GET /api/admin/products/{id}
#[instrument(skip(_admin, state))]
async fn show(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    Ok(Json(find(&state, &id).await?))
}

/// POST /api/admin/products
#[instrument(skip_all)]
async fn create(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    AppJson(product): AppJson<Product>,
) -> Result<(StatusCode, Json<Product>)> {
    validate(&product)?;
    let product = Repository::<Product>::new(state.store()).create(product).await?;
    state.catalog().invalidate().await;

    info!(product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/admin/products/{id}
///
/// Replaces the product. `createdAt` is kept from the stored document.
#[instrument(skip(_admin, state, product))]
async fn update(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(mut product): AppJson<Product>,
) -> Result<Json<Product>> {
    validate(&product)?;
    let existing = find(&state, &id).await?;

    product.id = ProductId::new(id);
    product.created_at = existing.created_at;
    let product = Repository::<Product>::new(state.store()).save(product).await?;
    state.catalog().invalidate().await;

    info!(product_id = %product.id, "Product updated");
    Ok(Json(product))
}

/// DELETE /api/admin/products/{id}
///
/// Stored images are removed too. Image deletes that fail are logged and
/// do not fail the request.
#[instrument(skip(_admin, state))]
async fn remove(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let product = find(&state, &id).await?;
    Repository::<Product>::new(state.store()).delete(&id).await?;
    state.catalog().invalidate().await;

    let uploads = state.uploads();
    join_all(product.images.iter().map(|url| uploads.delete_image_by_url(url))).await;

    info!(product_id = %id, images = product.images.len(), "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/admin/products/{id}/images
///
/// Multipart body with one or more image files. The new URLs are appended
/// to the product's images.
#[instrument(skip(_admin, state, multipart))]
async fn upload_images(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppMultipart(multipart): AppMultipart,
) -> Result<Json<Product>> {
    let mut product = find(&state, &id).await?;

    let form = UploadForm::read(multipart).await?;
    if form.files.is_empty() {
        return Err(AppError::BadRequest("No file provided".to_string()));
    }

    let uploaded = state
        .uploads()
        .upload_images(form.files, PRODUCTS_FOLDER)
        .await?;
    product.images.extend(uploaded.into_iter().map(|image| image.url));

    let product = Repository::<Product>::new(state.store()).save(product).await?;
    state.catalog().invalidate().await;
    Ok(Json(product))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{
        Part, app_for, body_json, send, send_admin, send_multipart, spawn_upload_service,
        test_config, test_state, test_state_with,
    };
    use axum::http::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_requires_token() {
        let app = app_for(test_state());
        let response = send(app.clone(), Method::GET, "/api/admin/products", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await,
            json!({"error": "Missing bearer token"})
        );

        let response = crate::testing::send_with(
            app,
            Method::GET,
            "/api/admin/products",
            None,
            &[("authorization", "Bearer wrong")],
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_crud_invalidates_catalog() {
        let state = test_state();
        let app = app_for(state.clone());

        // Warm the public cache.
        assert!(state.catalog().products().await.unwrap().is_empty());

        let response = send_admin(
            app.clone(),
            Method::POST,
            "/api/admin/products",
            Some(json!({"name": "Sea Salt", "price": 22.0, "stock": 4, "category": "jar"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        let id = created["id"].as_str().unwrap().to_string();
        assert!(created["createdAt"].is_string());
        assert_eq!(state.catalog().products().await.unwrap().len(), 1);

        let response = send_admin(
            app.clone(),
            Method::PUT,
            &format!("/api/admin/products/{id}"),
            Some(json!({"name": "Sea Salt & Sage", "price": 24.0})),
        )
        .await;
        let updated = body_json(response).await;
        assert_eq!(updated["name"], "Sea Salt & Sage");
        assert_eq!(updated["createdAt"], created["createdAt"]);
        assert_eq!(
            state.catalog().product(&id).await.unwrap().unwrap().name,
            "Sea Salt & Sage"
        );

        let response = send_admin(app.clone(), Method::DELETE, &format!("/api/admin/products/{id}"), None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(state.catalog().products().await.unwrap().is_empty());

        let response = send_admin(app, Method::GET, &format!("/api/admin/products/{id}"), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_validation() {
        let app = app_for(test_state());
        let response = send_admin(
            app.clone(),
            Method::POST,
            "/api/admin/products",
            Some(json!({"name": " ", "price": 10.0})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send_admin(
            app,
            Method::PUT,
            "/api/admin/products/ghost",
            Some(json!({"name": "Ghost", "price": 10.0})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_image_upload_appends_urls() {
        let mut config = test_config();
        config.storage.base_url = spawn_upload_service().await;
        let state = test_state_with(config);
        let product = Repository::<Product>::new(state.store())
            .create(Product {
                name: "Fig".to_string(),
                images: vec!["https://cdn.test/products/old.png".to_string()],
                ..Product::default()
            })
            .await
            .unwrap();

        let parts = [
            Part {
                name: "files",
                file: Some(("a.png", "image/png")),
                body: b"a",
            },
            Part {
                name: "files",
                file: Some(("b.jpg", "image/jpeg")),
                body: b"b",
            },
        ];
        let response = send_multipart(
            app_for(state),
            &format!("/api/admin/products/{}/images", product.id),
            &parts,
            true,
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(
            body["images"],
            json!([
                "https://cdn.test/products/old.png",
                "https://cdn.test/products/a.png",
                "https://cdn.test/products/b.jpg"
            ])
        );
    }
}
