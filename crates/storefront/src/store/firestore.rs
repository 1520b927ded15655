//! Firestore REST API client.
//!
//! Talks to `projects/{project}/databases/{db}/documents` with `reqwest`.
//! Listeners are implemented by polling: the REST surface has no streaming
//! listen call, so a background task re-lists the collection on an interval
//! and publishes a snapshot only when it differs from the last one.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use super::value::{decode_fields, encode_fields, encode_value};
use super::{Document, StoreError, Subscription};
use crate::config::FirestoreConfig;

/// Documents requested per list page.
const PAGE_SIZE: u32 = 300;

/// Outbound request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the Firestore REST API.
#[derive(Clone)]
pub struct FirestoreClient {
    inner: Arc<FirestoreClientInner>,
}

struct FirestoreClientInner {
    client: reqwest::Client,
    documents_url: String,
    api_key: Option<SecretString>,
    poll_interval: Duration,
}

/// Document as returned by the REST API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
    create_time: Option<DateTime<Utc>>,
    update_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunQueryItem {
    document: Option<RawDocument>,
}

impl TryFrom<RawDocument> for Document {
    type Error = StoreError;

    fn try_from(raw: RawDocument) -> Result<Self, Self::Error> {
        let id = raw
            .name
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| StoreError::Decode(format!("document name has no ID: {}", raw.name)))?
            .to_owned();

        Ok(Self {
            id,
            fields: decode_fields(&raw.fields)?,
            create_time: raw.create_time,
            update_time: raw.update_time,
        })
    }
}

impl FirestoreClient {
    /// Create a new Firestore client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &FirestoreConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(FirestoreClientInner {
                client,
                documents_url: config.documents_url(),
                api_key: config.api_key.clone(),
                poll_interval: config.poll_interval,
            }),
        })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{collection}", self.inner.documents_url)
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!(
            "{}/{collection}/{}",
            self.inner.documents_url,
            urlencoding::encode(id)
        )
    }

    /// Attach the API key, if configured.
    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.inner.api_key {
            Some(key) => request.query(&[("key", key.expose_secret())]),
            None => request,
        }
    }

    /// Send a request and map error statuses.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        collection: &str,
        id: &str,
    ) -> Result<reqwest::Response, StoreError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(StoreError::RateLimited(retry_after));
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Firestore returned non-success status"
            );
            return Err(StoreError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        Ok(response)
    }

    async fn read_document(response: reqwest::Response) -> Result<Document, StoreError> {
        let text = response.text().await?;
        let raw: RawDocument = serde_json::from_str(&text).map_err(|e| {
            StoreError::Decode(format!("invalid document response: {e}"))
        })?;
        Document::try_from(raw)
    }

    /// Fetch one document.
    #[instrument(skip(self))]
    pub(super) async fn get(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let request = self.inner.client.get(self.document_url(collection, id));
        match self.send(request, collection, id).await {
            Ok(response) => Self::read_document(response).await.map(Some),
            Err(StoreError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Fetch every page of a collection.
    #[instrument(skip(self))]
    pub(super) async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .inner
                .client
                .get(self.collection_url(collection))
                .query(&[("pageSize", PAGE_SIZE.to_string())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let page: ListResponse = match self.send(request, collection, "").await {
                Ok(response) => response
                    .json()
                    .await
                    .map_err(|e| StoreError::Decode(format!("invalid list response: {e}")))?,
                // A collection with no documents does not exist.
                Err(StoreError::NotFound { .. }) => return Ok(documents),
                Err(e) => return Err(e),
            };

            for raw in page.documents {
                documents.push(Document::try_from(raw)?);
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(count = documents.len(), "Listed collection");
        Ok(documents)
    }

    /// Equality query through `:runQuery`.
    #[instrument(skip(self, value))]
    pub(super) async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError> {
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": quote_field_path(field) },
                        "op": "EQUAL",
                        "value": encode_value(value),
                    }
                }
            }
        });

        let request = self
            .inner
            .client
            .post(format!("{}:runQuery", self.inner.documents_url))
            .json(&body);
        let items: Vec<RunQueryItem> = self
            .send(request, collection, "")
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Decode(format!("invalid query response: {e}")))?;

        items
            .into_iter()
            .filter_map(|item| item.document)
            .map(Document::try_from)
            .collect()
    }

    /// Create a document with a caller-chosen ID.
    #[instrument(skip(self, fields))]
    pub(super) async fn create(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let request = self
            .inner
            .client
            .post(self.collection_url(collection))
            .query(&[("documentId", id)])
            .json(&json!({ "fields": encode_fields(&fields) }));

        let response = self.send(request, collection, id).await?;
        Self::read_document(response).await
    }

    /// Replace a document, creating it if needed.
    #[instrument(skip(self, fields))]
    pub(super) async fn set(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let request = self
            .inner
            .client
            .patch(self.document_url(collection, id))
            .json(&json!({ "fields": encode_fields(&fields) }));

        let response = self.send(request, collection, id).await?;
        Self::read_document(response).await
    }

    /// Merge the given fields into an existing document.
    #[instrument(skip(self, fields))]
    pub(super) async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let mut params: Vec<(&str, String)> = fields
            .keys()
            .map(|key| ("updateMask.fieldPaths", quote_field_path(key)))
            .collect();
        params.push(("currentDocument.exists", "true".to_string()));

        let request = self
            .inner
            .client
            .patch(self.document_url(collection, id))
            .query(&params)
            .json(&json!({ "fields": encode_fields(&fields) }));

        let response = self.send(request, collection, id).await?;
        Self::read_document(response).await
    }

    /// Delete a document.
    #[instrument(skip(self))]
    pub(super) async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let request = self.inner.client.delete(self.document_url(collection, id));
        match self.send(request, collection, id).await {
            Ok(_) | Err(StoreError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Start a polling listener on a collection.
    pub(super) async fn subscribe(&self, collection: &str) -> Result<Subscription, StoreError> {
        let initial = self.list(collection).await?;
        let (sender, receiver) = watch::channel(initial);

        let client = self.clone();
        let collection = collection.to_string();
        let listener = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(client.inner.poll_interval);
            // The first tick fires immediately; the initial snapshot is already sent.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if sender.is_closed() {
                    break;
                }

                match client.list(&collection).await {
                    Ok(snapshot) => {
                        sender.send_if_modified(|current| {
                            if *current == snapshot {
                                false
                            } else {
                                *current = snapshot;
                                true
                            }
                        });
                    }
                    Err(e) => warn!(collection = %collection, error = %e, "Listener poll failed"),
                }
            }
        });

        Ok(Subscription::new(receiver, Some(listener)))
    }
}

/// Quote a field path segment unless it is a plain identifier.
fn quote_field_path(field: &str) -> String {
    let simple = field
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if simple {
        field.to_string()
    } else {
        format!("`{}`", field.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::{Path, Query},
        http::StatusCode,
        routing::get,
    };
    use std::collections::HashMap;

    fn config(base_url: String) -> FirestoreConfig {
        FirestoreConfig {
            project_id: "demo".to_string(),
            database: "(default)".to_string(),
            base_url,
            api_key: None,
            poll_interval: Duration::from_millis(20),
        }
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{addr}/v1")
    }

    const DOCS: &str = "/v1/projects/demo/databases/{db}/documents";

    #[test]
    fn test_quote_field_path() {
        assert_eq!(quote_field_path("isActive"), "isActive");
        assert_eq!(quote_field_path("_hidden"), "_hidden");
        assert_eq!(quote_field_path("9lives"), "`9lives`");
        assert_eq!(quote_field_path("hero-popup"), "`hero-popup`");
    }

    #[test]
    fn test_raw_document_id_from_name() {
        let raw = RawDocument {
            name: "projects/p/databases/(default)/documents/products/abc".to_string(),
            fields: json!({"name": {"stringValue": "Amber"}})
                .as_object()
                .cloned()
                .unwrap(),
            create_time: None,
            update_time: None,
        };
        let doc = Document::try_from(raw).unwrap();
        assert_eq!(doc.id, "abc");
        assert_eq!(doc.fields["name"], "Amber");
    }

    #[tokio::test]
    async fn test_get_maps_404_to_none() {
        let router = Router::new().route(
            &format!("{DOCS}/products/{{id}}"),
            get(|Path((_db, id)): Path<(String, String)>| async move {
                if id == "p1" {
                    Ok(Json(json!({
                        "name": "projects/demo/databases/(default)/documents/products/p1",
                        "fields": {"stock": {"integerValue": "7"}},
                        "createTime": "2025-03-01T10:00:00Z",
                        "updateTime": "2025-03-02T10:00:00Z"
                    })))
                } else {
                    Err(StatusCode::NOT_FOUND)
                }
            }),
        );
        let client = FirestoreClient::new(&config(serve(router).await)).unwrap();

        let doc = client.get("products", "p1").await.unwrap().unwrap();
        assert_eq!(doc.fields["stock"], 7);
        assert!(doc.update_time.is_some());
        assert!(client.get("products", "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_follows_page_tokens() {
        let router = Router::new().route(
            &format!("{DOCS}/banners"),
            get(|Query(params): Query<HashMap<String, String>>| async move {
                let doc = |id: &str| {
                    json!({
                        "name": format!("projects/demo/databases/(default)/documents/banners/{id}"),
                        "fields": {"title": {"stringValue": id}}
                    })
                };
                match params.get("pageToken").map(String::as_str) {
                    None => Json(json!({"documents": [doc("a")], "nextPageToken": "next"})),
                    Some(_) => Json(json!({"documents": [doc("b")]})),
                }
            }),
        );
        let client = FirestoreClient::new(&config(serve(router).await)).unwrap();

        let ids: Vec<String> = client
            .list("banners")
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_rate_limit_and_api_errors() {
        let router = Router::new()
            .route(
                &format!("{DOCS}/busy/{{id}}"),
                get(|| async {
                    (
                        StatusCode::TOO_MANY_REQUESTS,
                        [("Retry-After", "9")],
                        "slow down",
                    )
                }),
            )
            .route(
                &format!("{DOCS}/broken/{{id}}"),
                get(|| async { (StatusCode::FORBIDDEN, "PERMISSION_DENIED") }),
            );
        let client = FirestoreClient::new(&config(serve(router).await)).unwrap();

        assert!(matches!(
            client.get("busy", "x").await,
            Err(StoreError::RateLimited(9))
        ));
        match client.get("broken", "x").await {
            Err(StoreError::Api { status, message }) => {
                assert_eq!(status, 403);
                assert!(message.contains("PERMISSION_DENIED"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
