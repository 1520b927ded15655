//! Typed repositories over the document store.
//!
//! # Collections
//!
//! Each model implements [`Entity`] to name its collection. [`Repository`]
//! turns raw [`Document`]s into models and back:
//!
//! - Reads fill missing fields from the model's defaults.
//! - A document that fails to decode is logged and skipped in lists, and
//!   reported as [`RepositoryError::DataCorruption`] on single reads.
//! - Writes never persist the `id` field; it is the document ID.
//!
//! Singleton settings under `siteConfig/` go through [`SingletonRepository`],
//! which returns defaults when the document has never been written.
//!
//! Entity-specific queries live in the submodules.

pub mod contact;
pub mod content;
pub mod products;

use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::models::{
    Banner, BusinessConfig, CandleTemplate, ContactMessage, CustomFont, CustomizationConfig,
    HeroPopupConfig, Order, Product, Testimonial,
};
use crate::store::{Document, DocumentStore, StoreError, Subscription};

/// Collection holding singleton settings documents.
pub const SITE_CONFIG_COLLECTION: &str = "siteConfig";

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Document store request failed.
    #[error("store error: {0}")]
    Store(StoreError),

    /// Stored data does not match the model.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Model could not be turned into document fields.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<StoreError> for RepositoryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::NotFound,
            other => Self::Store(other),
        }
    }
}

/// A model stored as one document per instance.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection the documents live in.
    const COLLECTION: &'static str;

    /// Document ID.
    fn id(&self) -> &str;

    /// Called before the first write.
    fn stamp_created(&mut self, _now: DateTime<Utc>) {}

    /// Called before every write.
    fn stamp_updated(&mut self, _now: DateTime<Utc>) {}
}

/// A settings document stored at `siteConfig/{DOC_ID}`.
pub trait Singleton: Serialize + DeserializeOwned + Default + Send + Sync + 'static {
    /// Document ID under `siteConfig`.
    const DOC_ID: &'static str;

    /// Called before every write.
    fn stamp_updated(&mut self, _now: DateTime<Utc>) {}
}

macro_rules! impl_entity {
    ($ty:ty, $collection:literal $(, created: $created:ident)? $(, updated: $updated:ident)?) => {
        impl Entity for $ty {
            const COLLECTION: &'static str = $collection;

            fn id(&self) -> &str {
                self.id.as_str()
            }

            $(
                fn stamp_created(&mut self, now: DateTime<Utc>) {
                    self.$created = Some(now);
                }
            )?

            $(
                fn stamp_updated(&mut self, now: DateTime<Utc>) {
                    self.$updated = Some(now);
                }
            )?
        }
    };
}

impl_entity!(Product, "products", created: created_at, updated: updated_at);
impl_entity!(Order, "orders", created: created_at, updated: updated_at);
impl_entity!(ContactMessage, "contactMessages", created: created_at);
impl_entity!(CandleTemplate, "candleTemplates", created: created_at, updated: updated_at);
impl_entity!(CustomFont, "customFonts", created: created_at);
impl_entity!(Banner, "banners");
impl_entity!(Testimonial, "testimonials");

impl Singleton for HeroPopupConfig {
    const DOC_ID: &'static str = "heroPopup";

    fn stamp_updated(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }
}

impl Singleton for CustomizationConfig {
    const DOC_ID: &'static str = "customization";

    fn stamp_updated(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }
}

impl Singleton for BusinessConfig {
    const DOC_ID: &'static str = "business";
}

/// Decode a document into a model.
///
/// # Errors
///
/// Returns `RepositoryError::DataCorruption` naming the collection and ID.
pub fn decode<T: Entity>(document: Document) -> Result<T, RepositoryError> {
    let id = document.id.clone();
    serde_json::from_value(document.into_value()).map_err(|e| {
        RepositoryError::DataCorruption(format!("{}/{id}: {e}", T::COLLECTION))
    })
}

/// Serialize a model into document fields, dropping `id`.
fn encode<T: Serialize>(model: &T) -> Result<Map<String, Value>, RepositoryError> {
    match serde_json::to_value(model) {
        Ok(Value::Object(mut fields)) => {
            fields.remove("id");
            Ok(fields)
        }
        Ok(other) => Err(RepositoryError::Serialization(format!(
            "expected an object, got {other}"
        ))),
        Err(e) => Err(RepositoryError::Serialization(e.to_string())),
    }
}

fn decode_all<T: Entity>(documents: Vec<Document>) -> Vec<T> {
    documents
        .into_iter()
        .filter_map(|document| match decode::<T>(document) {
            Ok(model) => Some(model),
            Err(e) => {
                warn!(error = %e, "Skipping undecodable document");
                None
            }
        })
        .collect()
}

/// Repository for one collection.
pub struct Repository<'a, T> {
    store: &'a DocumentStore,
    _model: PhantomData<T>,
}

impl<'a, T: Entity> Repository<'a, T> {
    /// Create a new repository.
    #[must_use]
    pub const fn new(store: &'a DocumentStore) -> Self {
        Self {
            store,
            _model: PhantomData,
        }
    }

    /// Every decodable document in the collection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the store request fails.
    pub async fn list(&self) -> Result<Vec<T>, RepositoryError> {
        let documents = self.store.list(T::COLLECTION).await?;
        Ok(decode_all(documents))
    }

    /// Documents whose `field` equals `value`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the query fails.
    pub async fn find_by(&self, field: &str, value: Value) -> Result<Vec<T>, RepositoryError> {
        let documents = self.store.query_eq(T::COLLECTION, field, &value).await?;
        Ok(decode_all(documents))
    }

    /// Fetch one model.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the request fails.
    /// Returns `RepositoryError::DataCorruption` if the document does not decode.
    pub async fn get(&self, id: &str) -> Result<Option<T>, RepositoryError> {
        match self.store.get(T::COLLECTION, id).await? {
            Some(document) => decode(document).map(Some),
            None => Ok(None),
        }
    }

    /// Insert a new model under a generated ID. The model's own ID is ignored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the write fails.
    pub async fn create(&self, mut model: T) -> Result<T, RepositoryError> {
        let now = Utc::now();
        model.stamp_created(now);
        model.stamp_updated(now);

        let document = self.store.create(T::COLLECTION, encode(&model)?).await?;
        decode(document)
    }

    /// Write a model in full under its own ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the write fails.
    pub async fn save(&self, mut model: T) -> Result<T, RepositoryError> {
        model.stamp_updated(Utc::now());

        let document = self
            .store
            .set(T::COLLECTION, model.id(), encode(&model)?)
            .await?;
        decode(document)
    }

    /// Overwrite only the given fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the document does not exist.
    pub async fn patch(&self, id: &str, fields: Map<String, Value>) -> Result<T, RepositoryError> {
        let document = self.store.update(T::COLLECTION, id, fields).await?;
        decode(document)
    }

    /// Delete a model.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the request fails.
    pub async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        self.store.delete(T::COLLECTION, id).await?;
        Ok(())
    }

    /// Listen to the collection as typed snapshots.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the initial snapshot cannot be read.
    pub async fn subscribe(&self) -> Result<TypedSubscription<T>, RepositoryError> {
        let inner = self.store.subscribe(T::COLLECTION).await?;
        Ok(TypedSubscription {
            inner,
            _model: PhantomData,
        })
    }
}

/// [`Subscription`] that decodes each snapshot.
pub struct TypedSubscription<T> {
    inner: Subscription,
    _model: PhantomData<T>,
}

impl<T: Entity> TypedSubscription<T> {
    /// Wait for the next snapshot. Returns `None` once the source is gone.
    pub async fn next(&mut self) -> Option<Vec<T>> {
        self.inner.next().await.map(decode_all)
    }
}

/// Repository for a `siteConfig` document.
pub struct SingletonRepository<'a, T> {
    store: &'a DocumentStore,
    _model: PhantomData<T>,
}

impl<'a, T: Singleton> SingletonRepository<'a, T> {
    /// Create a new repository.
    #[must_use]
    pub const fn new(store: &'a DocumentStore) -> Self {
        Self {
            store,
            _model: PhantomData,
        }
    }

    /// Current settings, or defaults when never saved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the request fails.
    /// Returns `RepositoryError::DataCorruption` if the document does not decode.
    pub async fn load(&self) -> Result<T, RepositoryError> {
        match self.store.get(SITE_CONFIG_COLLECTION, T::DOC_ID).await? {
            Some(document) => serde_json::from_value(Value::Object(document.fields)).map_err(|e| {
                RepositoryError::DataCorruption(format!(
                    "{SITE_CONFIG_COLLECTION}/{}: {e}",
                    T::DOC_ID
                ))
            }),
            None => Ok(T::default()),
        }
    }

    /// Replace the settings document.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the write fails.
    pub async fn save(&self, mut settings: T) -> Result<T, RepositoryError> {
        settings.stamp_updated(Utc::now());

        let document = self
            .store
            .set(SITE_CONFIG_COLLECTION, T::DOC_ID, encode(&settings)?)
            .await?;

        serde_json::from_value(Value::Object(document.fields))
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))
    }
}
