//! Image proxy endpoints.
//!
//! The design editor draws remote images onto a canvas, which browsers only
//! allow when the image is served with permissive CORS headers. These two
//! endpoints fetch an image from an allowed host and relay it with those
//! headers:
//!
//! - `/api/image-proxy` - Firebase Storage URLs
//! - `/api/b2-proxy` - Backblaze B2 URLs

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_TYPE,
        },
    },
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, instrument, warn};

use crate::extract::AppQuery;
use crate::state::AppState;

/// Which proxy is serving the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyKind {
    Image,
    B2,
}

impl ProxyKind {
    fn allowed_domain(self, state: &AppState) -> &str {
        match self {
            Self::Image => &state.config().proxy.image_domain,
            Self::B2 => &state.config().proxy.b2_domain,
        }
    }
}

/// Query string for both proxies.
#[derive(Debug, Deserialize)]
pub struct ProxyParams {
    pub url: Option<String>,
}

/// Errors returned by the proxies.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("URL parameter is required")]
    MissingUrl,

    #[error("Invalid URL domain")]
    InvalidDomain,

    /// Upstream answered with a non-success status.
    #[error("Failed to fetch image: {reason}")]
    Upstream { status: StatusCode, reason: String },

    /// Upstream could not be reached.
    #[error("Failed to proxy image")]
    Network(#[from] reqwest::Error),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::MissingUrl | Self::InvalidDomain => StatusCode::BAD_REQUEST,
            Self::Upstream { status, .. } => *status,
            Self::Network(e) => {
                error!(error = %e, "Image proxy request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let mut response = (status, Json(json!({ "error": self.to_string() }))).into_response();
        insert_cors_headers(response.headers_mut());
        response
    }
}

fn insert_cors_headers(headers: &mut HeaderMap) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
}

/// Fetch `url` and relay it with cross-origin headers.
async fn relay(state: &AppState, kind: ProxyKind, params: ProxyParams) -> Result<Response, ProxyError> {
    let url = params
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or(ProxyError::MissingUrl)?;

    if !url.contains(kind.allowed_domain(state)) {
        warn!(url = %url, "Image proxy rejected URL");
        return Err(ProxyError::InvalidDomain);
    }

    let upstream = state.http().get(&url).send().await?;
    let status = upstream.status();
    if !status.is_success() {
        let status = StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        return Err(ProxyError::Upstream {
            status,
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        });
    }

    let content_type = upstream
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| HeaderValue::from_bytes(v.as_bytes()).ok())
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));
    let bytes = upstream.bytes().await?;

    let mut response = Response::new(Body::from(bytes));
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, content_type);
    insert_cors_headers(headers);
    if let Ok(cache) = HeaderValue::from_str(&format!(
        "public, max-age={}",
        state.config().proxy.cache_seconds
    )) {
        headers.insert(CACHE_CONTROL, cache);
    }

    Ok(response)
}

/// GET /api/image-proxy?url=
#[instrument(skip(state))]
pub async fn image_proxy(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ProxyParams>,
) -> Result<Response, ProxyError> {
    relay(&state, ProxyKind::Image, params).await
}

/// GET /api/b2-proxy?url=
#[instrument(skip(state))]
pub async fn b2_proxy(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ProxyParams>,
) -> Result<Response, ProxyError> {
    relay(&state, ProxyKind::B2, params).await
}

/// OPTIONS on either proxy: preflight answer.
pub async fn preflight() -> Response {
    let mut response = StatusCode::OK.into_response();
    insert_cors_headers(response.headers_mut());
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{body_json, send, test_app_with, test_config};
    use axum::{Router, http::Method, routing::get};

    /// Upstream serving `/ok.png`, `/gone.png` (404) and `/plain` (no type).
    async fn upstream() -> String {
        let router = Router::new()
            .route(
                "/ok.png",
                get(|| async { ([(CONTENT_TYPE, "image/png")], vec![1u8, 2, 3]) }),
            )
            .route("/gone.png", get(|| async { StatusCode::NOT_FOUND }))
            .route(
                "/plain",
                get(|| async {
                    let mut response = Response::new(Body::from("raw"));
                    response.headers_mut().remove(CONTENT_TYPE);
                    response
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{addr}")
    }

    fn app() -> Router {
        let mut config = test_config();
        config.proxy.image_domain = "127.0.0.1".to_string();
        config.proxy.b2_domain = "b2.invalid".to_string();
        config.proxy.cache_seconds = 3600;
        test_app_with(config)
    }

    fn proxy_uri(path: &str, target: &str) -> String {
        format!("{path}?url={}", urlencoding::encode(target))
    }

    #[tokio::test]
    async fn test_missing_url_is_bad_request() {
        let response = send(app(), Method::GET, "/api/image-proxy", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"error": "URL parameter is required"})
        );
    }

    #[tokio::test]
    async fn test_wrong_domain_is_bad_request() {
        let uri = proxy_uri("/api/b2-proxy", "https://evil.example/x.png");
        let response = send(app(), Method::GET, &uri, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({"error": "Invalid URL domain"}));
    }

    #[tokio::test]
    async fn test_relays_image_with_cors_and_cache() {
        let base = upstream().await;
        let uri = proxy_uri("/api/image-proxy", &format!("{base}/ok.png"));
        let response = send(app(), Method::GET, &uri, None).await;

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[CONTENT_TYPE], "image/png");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], "GET, OPTIONS");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
        assert_eq!(headers[CACHE_CONTROL], "public, max-age=3600");
        assert!(headers.get("x-frame-options").is_none());

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body.as_ref(), &[1, 2, 3]);
    }

    #[tokio::test]
    async fn test_missing_content_type_defaults_to_octet_stream() {
        let base = upstream().await;
        let uri = proxy_uri("/api/image-proxy", &format!("{base}/plain"));
        let response = send(app(), Method::GET, &uri, None).await;
        assert_eq!(response.headers()[CONTENT_TYPE], "application/octet-stream");
    }

    #[tokio::test]
    async fn test_upstream_status_passes_through() {
        let base = upstream().await;
        let uri = proxy_uri("/api/image-proxy", &format!("{base}/gone.png"));
        let response = send(app(), Method::GET, &uri, None).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            json!({"error": "Failed to fetch image: Not Found"})
        );
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_500() {
        // Port 9 (discard) on loopback is closed in test environments.
        let uri = proxy_uri("/api/image-proxy", "http://127.0.0.1:9/x.png");
        let response = send(app(), Method::GET, &uri, None).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await, json!({"error": "Failed to proxy image"}));
    }

    #[tokio::test]
    async fn test_preflight() {
        for path in ["/api/image-proxy", "/api/b2-proxy"] {
            let response = send(app(), Method::OPTIONS, path, None).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        }
    }
}
