//! Helpers shared by router tests.

#![allow(clippy::unwrap_used)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    Extension, Router,
    body::{Body, to_bytes},
    extract::ConnectInfo,
    http::{Method, Request, Response, header},
};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use crate::config::{FirestoreConfig, ProxyConfig, StorageConfig, StorefrontConfig};
use crate::routes;
use crate::state::AppState;
use crate::store::{DocumentStore, MemoryStore};

pub const ADMIN_TOKEN: &str = "test-admin-token-with-plenty-of-entropy-0123";

/// Configuration pointing at nothing real.
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        admin_token: SecretString::from(ADMIN_TOKEN),
        firestore: FirestoreConfig {
            project_id: "demo".to_string(),
            database: "(default)".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: None,
            poll_interval: Duration::from_millis(50),
        },
        storage: StorageConfig {
            base_url: "http://127.0.0.1:9".to_string(),
        },
        proxy: ProxyConfig::default(),
        text_detection_delay: Duration::ZERO,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// State over a fresh in-memory store.
pub fn test_state_with(config: StorefrontConfig) -> AppState {
    AppState::new(config, DocumentStore::Memory(MemoryStore::new())).unwrap()
}

pub fn test_state() -> AppState {
    test_state_with(test_config())
}

/// Peer address the rate limiters see for `oneshot` requests.
pub const TEST_PEER: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
    40_000,
);

/// Full application router. Requests carry the same `ConnectInfo` a server
/// started with `into_make_service_with_connect_info` would add.
pub fn app_for(state: AppState) -> Router {
    routes::app(state).layer(Extension(ConnectInfo(TEST_PEER)))
}

pub fn test_app_with(config: StorefrontConfig) -> Router {
    app_for(test_state_with(config))
}

/// Send one request. `body` is sent as JSON when present.
pub async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
    send_with(app, method, uri, body, &[]).await
}

/// Send one request with extra headers.
pub async fn send_with(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    headers: &[(&str, &str)],
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

/// Send as the admin.
pub async fn send_admin(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> Response<Body> {
    let bearer = format!("Bearer {ADMIN_TOKEN}");
    send_with(app, method, uri, body, &[("authorization", &bearer)]).await
}

/// `name=value` of the session cookie set by a response, if any.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| v.split(';').next().map(str::to_string))
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub const BOUNDARY: &str = "ember-wick-test-boundary";

/// A multipart part: field name, optional file name with content type, body.
pub struct Part<'a> {
    pub name: &'a str,
    pub file: Option<(&'a str, &'a str)>,
    pub body: &'a [u8],
}

/// Encode parts as a `multipart/form-data` body using [`BOUNDARY`].
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part.file {
            Some((file_name, content_type)) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n",
                    part.name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name).as_bytes(),
            ),
        }
        body.extend_from_slice(part.body);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Send a multipart request, optionally as the admin.
pub async fn send_multipart(app: Router, uri: &str, parts: &[Part<'_>], admin: bool) -> Response<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if admin {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"));
    }
    let request = builder.body(Body::from(multipart_body(parts))).unwrap();
    app.oneshot(request).await.unwrap()
}

/// Upload service stand-in.
///
/// `POST /upload` answers `{url, path}` built from the `folder` field and the
/// file name. `DELETE /delete` always succeeds. Returns the base URL.
pub async fn spawn_upload_service() -> String {
    use axum::{Json, extract::Multipart, routing::{delete, post}};
    use serde_json::json;

    async fn upload(mut multipart: Multipart) -> Json<Value> {
        let mut folder = String::new();
        let mut file_name = String::new();
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "folder" => folder = field.text().await.unwrap(),
                "file" => {
                    file_name = field.file_name().map(str::to_string).unwrap_or_default();
                    field.bytes().await.unwrap();
                }
                _ => {}
            }
        }
        let path = format!("{folder}/{file_name}");
        Json(json!({ "url": format!("https://cdn.test/{path}"), "path": path }))
    }

    let router = Router::new()
        .route("/upload", post(upload))
        .route("/delete", delete(|| async { Json(json!({ "success": true })) }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    format!("http://{addr}")
}
