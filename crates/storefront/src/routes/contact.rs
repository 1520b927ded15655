//! Contact form route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use ember_wick_core::Email;

use crate::db::contact::ContactRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::AppJson;
use crate::models::ContactMessage;
use crate::state::AppState;

/// Longest accepted message body, in characters.
const MAX_MESSAGE_LENGTH: usize = 5000;

/// Contact form data.
#[derive(Debug, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Submit a contact message.
///
/// POST /api/contact
#[instrument(skip(state, form))]
pub async fn submit(
    State(state): State<AppState>,
    AppJson(form): AppJson<ContactForm>,
) -> Result<(StatusCode, Json<ContactMessage>)> {
    let name = form.name.trim();
    let message = form.message.trim();
    if name.is_empty() || message.is_empty() {
        return Err(AppError::BadRequest(
            "Name and message are required".to_string(),
        ));
    }
    if message.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Message must be at most {MAX_MESSAGE_LENGTH} characters"
        )));
    }

    let email = Email::parse(&form.email)
        .map_err(|_| AppError::BadRequest("Please enter a valid email address".to_string()))?;

    let stored = ContactRepository::new(state.store())
        .submit(ContactMessage {
            name: name.to_string(),
            email: email.into_inner(),
            phone: optional(form.phone),
            subject: optional(form.subject),
            message: message.to_string(),
            ..ContactMessage::default()
        })
        .await?;

    add_breadcrumb("contact", "Contact message submitted", None);
    Ok((StatusCode::CREATED, Json(stored)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{app_for, body_json, send, test_state};
    use axum::http::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_submit_stores_unread_message() {
        let state = test_state();
        let response = send(
            app_for(state.clone()),
            Method::POST,
            "/api/contact",
            Some(json!({
                "name": " Robin ",
                "email": "Robin@Example.com",
                "subject": "",
                "message": "Do you ship to Canada?"
            })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["name"], "Robin");
        assert_eq!(body["email"], "robin@example.com");
        assert_eq!(body["read"], false);
        assert!(body.get("subject").is_none());

        let inbox = ContactRepository::new(state.store()).inbox().await.unwrap();
        assert_eq!(inbox.unread_count, 1);
    }

    #[tokio::test]
    async fn test_validation() {
        let app = app_for(test_state());

        let response = send(
            app.clone(),
            Method::POST,
            "/api/contact",
            Some(json!({"name": "", "email": "a@b.co", "message": "hi"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            app,
            Method::POST,
            "/api/contact",
            Some(json!({"name": "Robin", "email": "robin", "message": "hi"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"error": "Please enter a valid email address"})
        );
    }
}
