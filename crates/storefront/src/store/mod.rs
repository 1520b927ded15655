//! Managed document store access.
//!
//! # Architecture
//!
//! - The hosted Firestore database is the source of truth. There is no local
//!   sync; every read goes over the REST API (catalog reads are cached one
//!   level up in [`crate::services::Catalog`]).
//! - Documents travel as plain `serde_json` maps. The Firestore typed-value
//!   wire format is confined to [`value`].
//! - [`DocumentStore`] dispatches between the REST client and an in-memory
//!   store used by tests and local development.
//!
//! # Listeners
//!
//! [`DocumentStore::subscribe`] hands out a [`Subscription`] that yields the
//! collection snapshot immediately and again after every change. Dropping the
//! subscription tears the listener down.

mod firestore;
mod memory;
pub mod value;

pub use firestore::FirestoreClient;
pub use memory::MemoryStore;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Length of generated document IDs (matches Firestore auto-IDs).
pub const AUTO_ID_LENGTH: usize = 20;

/// Errors that can occur when talking to the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Document does not exist.
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// Rate limited by the store.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Response or value could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
}

/// A stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Document ID (last path segment).
    pub id: String,
    /// Field values.
    pub fields: Map<String, Value>,
    /// When the document was created, if the store reports it.
    pub create_time: Option<DateTime<Utc>>,
    /// When the document was last written, if the store reports it.
    pub update_time: Option<DateTime<Utc>>,
}

impl Document {
    /// Fields merged with the `id` key, ready for typed deserialization.
    #[must_use]
    pub fn into_value(self) -> Value {
        let mut fields = self.fields;
        fields.insert("id".to_string(), Value::String(self.id));
        Value::Object(fields)
    }
}

/// Document store backend.
#[derive(Clone)]
pub enum DocumentStore {
    /// Hosted Firestore over REST.
    Firestore(FirestoreClient),
    /// Process-local store.
    Memory(MemoryStore),
}

impl DocumentStore {
    /// Fetch one document.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails. A missing document is `Ok(None)`.
    pub async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        match self {
            Self::Firestore(client) => client.get(collection, id).await,
            Self::Memory(store) => Ok(store.get(collection, id)),
        }
    }

    /// Fetch every document in a collection, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    pub async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        match self {
            Self::Firestore(client) => client.list(collection).await,
            Self::Memory(store) => Ok(store.list(collection)),
        }
    }

    /// Fetch documents whose `field` equals `value`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError> {
        match self {
            Self::Firestore(client) => client.query_eq(collection, field, value).await,
            Self::Memory(store) => Ok(store.query_eq(collection, field, value)),
        }
    }

    /// Create a document under a generated ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn create(
        &self,
        collection: &str,
        fields: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let id = generate_id();
        match self {
            Self::Firestore(client) => client.create(collection, &id, fields).await,
            Self::Memory(store) => Ok(store.set(collection, &id, fields)),
        }
    }

    /// Write a document in full, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn set(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        match self {
            Self::Firestore(client) => client.set(collection, id, fields).await,
            Self::Memory(store) => Ok(store.set(collection, id, fields)),
        }
    }

    /// Overwrite only the given fields of an existing document.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the document does not exist.
    pub async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        match self {
            Self::Firestore(client) => client.update(collection, id, fields).await,
            Self::Memory(store) => store.update(collection, id, fields),
        }
    }

    /// Delete a document. Deleting a missing document succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        match self {
            Self::Firestore(client) => client.delete(collection, id).await,
            Self::Memory(store) => {
                store.delete(collection, id);
                Ok(())
            }
        }
    }

    /// Listen to a collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial snapshot cannot be read.
    pub async fn subscribe(&self, collection: &str) -> Result<Subscription, StoreError> {
        match self {
            Self::Firestore(client) => client.subscribe(collection).await,
            Self::Memory(store) => Ok(store.subscribe(collection)),
        }
    }

    /// Short name of the backend, for logs and health output.
    #[must_use]
    pub const fn backend_name(&self) -> &'static str {
        match self {
            Self::Firestore(_) => "firestore",
            Self::Memory(_) => "memory",
        }
    }
}

/// Live view of a collection.
///
/// The first call to [`Subscription::next`] returns the snapshot taken when
/// the subscription was created; later calls wait for the next change.
pub struct Subscription {
    receiver: watch::Receiver<Vec<Document>>,
    listener: Option<JoinHandle<()>>,
    primed: bool,
}

impl Subscription {
    pub(crate) const fn new(
        receiver: watch::Receiver<Vec<Document>>,
        listener: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            receiver,
            listener,
            primed: false,
        }
    }

    /// Wait for the next snapshot. Returns `None` once the source is gone.
    pub async fn next(&mut self) -> Option<Vec<Document>> {
        if !self.primed {
            self.primed = true;
            return Some(self.receiver.borrow_and_update().clone());
        }

        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
            tracing::debug!("Collection listener stopped");
        }
    }
}

/// Generate a 20-character alphanumeric document ID.
#[must_use]
pub fn generate_id() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(AUTO_ID_LENGTH)
        .map(char::from)
        .collect()
}
