//! Contact message inbox.

use futures::future::join_all;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::{Repository, RepositoryError, TypedSubscription};
use crate::models::ContactMessage;
use crate::store::DocumentStore;

/// Outcome of a bulk mark-as-read.
///
/// Writes are independent: when some fail, the others stay applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAllReadReport {
    pub updated: Vec<String>,
    pub failed: Vec<String>,
}

/// Inbox listing with its unread count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inbox {
    pub messages: Vec<ContactMessage>,
    pub unread_count: usize,
}

impl Inbox {
    /// Sort newest first and count unread.
    #[must_use]
    pub fn from_messages(mut messages: Vec<ContactMessage>) -> Self {
        // Messages without a timestamp sort last.
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let unread_count = messages.iter().filter(|m| !m.read).count();
        Self {
            messages,
            unread_count,
        }
    }
}

/// Repository for contact messages.
pub struct ContactRepository<'a> {
    messages: Repository<'a, ContactMessage>,
}

impl<'a> ContactRepository<'a> {
    /// Create a new contact repository.
    #[must_use]
    pub const fn new(store: &'a DocumentStore) -> Self {
        Self {
            messages: Repository::new(store),
        }
    }

    /// Store a new unread message.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the write fails.
    pub async fn submit(&self, mut message: ContactMessage) -> Result<ContactMessage, RepositoryError> {
        message.read = false;
        let message = self.messages.create(message).await?;
        info!(message_id = %message.id, "Contact message stored");
        Ok(message)
    }

    /// All messages, newest first, with the unread count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the request fails.
    pub async fn inbox(&self) -> Result<Inbox, RepositoryError> {
        Ok(Inbox::from_messages(self.messages.list().await?))
    }

    /// Mark one message as read.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the message does not exist.
    pub async fn mark_read(&self, id: &str) -> Result<ContactMessage, RepositoryError> {
        self.messages.patch(id, read_flag()).await
    }

    /// Mark every unread message as read with one write per message.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the messages cannot be listed.
    /// Individual write failures are reported in the result instead.
    pub async fn mark_all_read(&self) -> Result<MarkAllReadReport, RepositoryError> {
        let unread: Vec<String> = self
            .messages
            .list()
            .await?
            .into_iter()
            .filter(|m| !m.read)
            .map(|m| m.id.into_inner())
            .collect();

        let writes = unread.iter().map(|id| async move {
            let result = self.messages.patch(id, read_flag()).await;
            (id.clone(), result)
        });

        let mut report = MarkAllReadReport::default();
        for (id, result) in join_all(writes).await {
            match result {
                Ok(_) => report.updated.push(id),
                Err(e) => {
                    warn!(message_id = %id, error = %e, "Failed to mark message read");
                    report.failed.push(id);
                }
            }
        }

        Ok(report)
    }

    /// Delete a message.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the request fails.
    pub async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        self.messages.delete(id).await
    }

    /// Live inbox snapshots.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the initial snapshot cannot be read.
    pub async fn subscribe(&self) -> Result<TypedSubscription<ContactMessage>, RepositoryError> {
        self.messages.subscribe().await
    }
}

fn read_flag() -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("read".to_string(), Value::Bool(true));
    fields
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::{TimeZone, Utc};
    use ember_wick_core::ContactMessageId;

    fn message(name: &str) -> ContactMessage {
        ContactMessage {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            message: "Do you ship to Canada?".to_string(),
            ..ContactMessage::default()
        }
    }

    #[test]
    fn test_inbox_sorts_newest_first() {
        let at = |day| Some(Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap());
        let inbox = Inbox::from_messages(vec![
            ContactMessage {
                id: ContactMessageId::new("old"),
                created_at: at(1),
                read: true,
                ..ContactMessage::default()
            },
            ContactMessage {
                id: ContactMessageId::new("undated"),
                ..ContactMessage::default()
            },
            ContactMessage {
                id: ContactMessageId::new("new"),
                created_at: at(9),
                ..ContactMessage::default()
            },
        ]);

        let ids: Vec<&str> = inbox.messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old", "undated"]);
        assert_eq!(inbox.unread_count, 2);
    }

    #[tokio::test]
    async fn test_submit_forces_unread() {
        let store = DocumentStore::Memory(MemoryStore::new());
        let repo = ContactRepository::new(&store);

        let stored = repo
            .submit(ContactMessage {
                read: true,
                ..message("Jo")
            })
            .await
            .unwrap();
        assert!(!stored.read);
        assert!(stored.created_at.is_some());
    }

    #[tokio::test]
    async fn test_mark_read_and_mark_all_read() {
        let store = DocumentStore::Memory(MemoryStore::new());
        let repo = ContactRepository::new(&store);

        let first = repo.submit(message("Ada")).await.unwrap();
        repo.submit(message("Bo")).await.unwrap();
        repo.submit(message("Cy")).await.unwrap();

        assert!(repo.mark_read(first.id.as_str()).await.unwrap().read);
        assert_eq!(repo.inbox().await.unwrap().unread_count, 2);

        let report = repo.mark_all_read().await.unwrap();
        assert_eq!(report.updated.len(), 2);
        assert!(report.failed.is_empty());
        assert_eq!(repo.inbox().await.unwrap().unread_count, 0);

        assert!(matches!(
            repo.mark_read("missing").await,
            Err(RepositoryError::NotFound)
        ));
    }
}
