//! Health checks.

use axum::{extract::State, http::StatusCode};
use tracing::warn;

use crate::db::SITE_CONFIG_COLLECTION;
use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Reads one settings document to prove the document store answers.
/// Returns 503 Service Unavailable if it does not.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().get(SITE_CONFIG_COLLECTION, "business").await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            warn!(backend = state.store().backend_name(), error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::{DocumentStore, FirestoreClient};
    use crate::testing::{app_for, send, test_config, test_state};
    use axum::http::Method;

    #[tokio::test]
    async fn test_health() {
        let response = send(app_for(test_state()), Method::GET, "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body.as_ref(), b"ok");
    }

    #[tokio::test]
    async fn test_ready_with_memory_store() {
        let response = send(app_for(test_state()), Method::GET, "/health/ready", None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_not_ready_when_store_unreachable() {
        let config = test_config();
        let store = DocumentStore::Firestore(FirestoreClient::new(&config.firestore).unwrap());
        let state = AppState::new(config, store).unwrap();

        let response = send(app_for(state), Method::GET, "/health/ready", None).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
