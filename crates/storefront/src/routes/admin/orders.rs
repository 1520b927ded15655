//! Order management.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, put},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{info, instrument};

use ember_wick_core::OrderStatus;

use crate::db::{Repository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::AppJson;
use crate::middleware::RequireAdmin;
use crate::models::Order;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{id}", get(show))
        .route("/{id}/status", put(set_status))
}

#[derive(Debug, Deserialize)]
struct StatusRequest {
    status: OrderStatus,
}

/// GET /api/admin/orders
///
/// Newest first.
#[instrument(skip_all)]
async fn list(_admin: RequireAdmin, State(state): State<AppState>) -> Result<Json<Vec<Order>>> {
    let mut orders = Repository::<Order>::new(state.store()).list().await?;
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(orders))
}

/// GET /api/admin/orders/{id}
#[instrument(skip(_admin, state))]
async fn show(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Order>> {
    Repository::<Order>::new(state.store())
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Order".to_string()))
}

/// PUT /api/admin/orders/{id}/status
///
/// Any status may follow any other.
#[instrument(skip(_admin, state))]
async fn set_status(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(request): AppJson<StatusRequest>,
) -> Result<Json<Order>> {
    let mut fields = Map::new();
    fields.insert(
        "status".to_string(),
        Value::String(request.status.as_str().to_string()),
    );
    fields.insert(
        "updatedAt".to_string(),
        Value::String(Utc::now().to_rfc3339()),
    );

    let order = Repository::<Order>::new(state.store())
        .patch(&id, fields)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Order".to_string()),
            other => other.into(),
        })?;

    info!(order_id = %id, status = %request.status.as_str(), "Order status changed");
    Ok(Json(order))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{app_for, body_json, send_admin, test_state};
    use axum::http::{Method, StatusCode};
    use chrono::Duration;
    use serde_json::json;

    #[tokio::test]
    async fn test_list_newest_first_and_set_status() {
        let state = test_state();
        let repo = Repository::<Order>::new(state.store());
        let older = repo.create(Order::default()).await.unwrap();
        let newer = repo.create(Order::default()).await.unwrap();
        // Both were stamped within the same instant; push the first one back.
        repo.save(Order {
            created_at: older.created_at.map(|t| t - Duration::hours(1)),
            ..older.clone()
        })
        .await
        .unwrap();

        let app = app_for(state);
        let body = body_json(send_admin(app.clone(), Method::GET, "/api/admin/orders", None).await).await;
        let ids: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec![newer.id.as_str(), older.id.as_str()]);

        let response = send_admin(
            app.clone(),
            Method::PUT,
            &format!("/api/admin/orders/{}/status", older.id),
            Some(json!({"status": "shipped"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "shipped");

        // Transitions are not enforced.
        let response = send_admin(
            app.clone(),
            Method::PUT,
            &format!("/api/admin/orders/{}/status", older.id),
            Some(json!({"status": "pending"})),
        )
        .await;
        assert_eq!(body_json(response).await["status"], "pending");

        let response = send_admin(
            app.clone(),
            Method::PUT,
            &format!("/api/admin/orders/{}/status", older.id),
            Some(json!({"status": "lost"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());

        let response = send_admin(
            app,
            Method::PUT,
            "/api/admin/orders/ghost/status",
            Some(json!({"status": "shipped"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({"error": "Order not found"}));
    }
}
