//! In-process document store.
//!
//! Behaves like the hosted store for the operations the storefront uses:
//! ordered listing, equality queries, merge updates that fail on missing
//! documents, and push-based listeners.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::watch;

use super::{Document, StoreError, Subscription};

type Collections = HashMap<String, BTreeMap<String, Document>>;

/// Document store held in memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    collections: RwLock<Collections>,
    listeners: RwLock<HashMap<String, watch::Sender<Vec<Document>>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn get(&self, collection: &str, id: &str) -> Option<Document> {
        self.read()
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    pub(super) fn list(&self, collection: &str) -> Vec<Document> {
        self.read()
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default()
    }

    pub(super) fn query_eq(&self, collection: &str, field: &str, value: &Value) -> Vec<Document> {
        self.list(collection)
            .into_iter()
            .filter(|doc| doc.fields.get(field) == Some(value))
            .collect()
    }

    pub(super) fn set(&self, collection: &str, id: &str, fields: Map<String, Value>) -> Document {
        let now = Utc::now();
        let document = {
            let mut collections = self.write();
            let docs = collections.entry(collection.to_string()).or_default();
            let create_time = docs.get(id).and_then(|d| d.create_time).unwrap_or(now);
            let document = Document {
                id: id.to_string(),
                fields,
                create_time: Some(create_time),
                update_time: Some(now),
            };
            docs.insert(id.to_string(), document.clone());
            document
        };

        self.notify(collection);
        document
    }

    pub(super) fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let document = {
            let mut collections = self.write();
            let existing = collections
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| StoreError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })?;

            existing.fields.extend(fields);
            existing.update_time = Some(Utc::now());
            existing.clone()
        };

        self.notify(collection);
        Ok(document)
    }

    pub(super) fn delete(&self, collection: &str, id: &str) {
        let removed = self
            .write()
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .is_some();

        if removed {
            self.notify(collection);
        }
    }

    pub(super) fn subscribe(&self, collection: &str) -> Subscription {
        // Hold the listener lock while taking the snapshot so a concurrent
        // write either lands in it or finds the new sender.
        let mut listeners = self
            .inner
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let receiver = match listeners.get(collection) {
            Some(sender) => sender.subscribe(),
            None => {
                let (sender, receiver) = watch::channel(self.list(collection));
                listeners.insert(collection.to_string(), sender);
                receiver
            }
        };

        Subscription::new(receiver, None)
    }

    fn notify(&self, collection: &str) {
        let listeners = self
            .inner
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(sender) = listeners.get(collection) {
            sender.send_replace(self.list(collection));
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Collections> {
        self.inner
            .collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Collections> {
        self.inner
            .collections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
