//! Contact inbox.

use std::convert::Infallible;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{delete, get, post},
};
use futures::Stream;
use tracing::{debug, instrument, warn};

use crate::db::contact::{ContactRepository, Inbox, MarkAllReadReport};
use crate::db::RepositoryError;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::ContactMessage;
use crate::state::AppState;

/// SSE event name carrying an inbox snapshot.
pub const INBOX_EVENT: &str = "inbox";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(inbox))
        .route("/stream", get(stream))
        .route("/read-all", post(mark_all_read))
        .route("/{id}/read", post(mark_read))
        .route("/{id}", delete(remove))
}

/// GET /api/admin/messages
#[instrument(skip_all)]
async fn inbox(_admin: RequireAdmin, State(state): State<AppState>) -> Result<Json<Inbox>> {
    Ok(Json(ContactRepository::new(state.store()).inbox().await?))
}

/// POST /api/admin/messages/{id}/read
#[instrument(skip(_admin, state))]
async fn mark_read(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ContactMessage>> {
    ContactRepository::new(state.store())
        .mark_read(&id)
        .await
        .map(Json)
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Message".to_string()),
            other => other.into(),
        })
}

/// POST /api/admin/messages/read-all
///
/// Reports which messages were updated and which failed.
#[instrument(skip_all)]
async fn mark_all_read(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<MarkAllReadReport>> {
    Ok(Json(
        ContactRepository::new(state.store()).mark_all_read().await?,
    ))
}

/// DELETE /api/admin/messages/{id}
#[instrument(skip(_admin, state))]
async fn remove(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    ContactRepository::new(state.store()).delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/admin/messages/stream
///
/// Server-sent events: one `inbox` event with the current snapshot, then one
/// per change. The store listener stops when the client disconnects.
#[instrument(skip_all)]
async fn stream(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let mut subscription = ContactRepository::new(state.store()).subscribe().await?;

    let events = async_stream::stream! {
        while let Some(messages) = subscription.next().await {
            let inbox = Inbox::from_messages(messages);
            debug!(messages = inbox.messages.len(), "Sending inbox snapshot");
            match Event::default().event(INBOX_EVENT).json_data(&inbox) {
                Ok(event) => yield Ok(event),
                Err(e) => warn!(error = %e, "Failed to serialize inbox snapshot"),
            }
        }
    };

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
