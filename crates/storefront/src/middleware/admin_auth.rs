//! Bearer-token guard for the admin API.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use secrecy::ExposeSecret;

use crate::error::AppError;
use crate::state::AppState;

/// Extractor that requires `Authorization: Bearer <ADMIN_API_TOKEN>`.
///
/// # Example
///
/// ```rust,ignore
/// async fn list_orders(_admin: RequireAdmin, State(state): State<AppState>) -> Result<...> {
///     ...
/// }
/// ```
pub struct RequireAdmin;

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let provided = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;

        let expected = state.config().admin_token.expose_secret();
        if !constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
            tracing::warn!(path = %parts.uri.path(), "Rejected admin token");
            return Err(AppError::Unauthorized("Invalid token".to_string()));
        }

        Ok(Self)
    }
}

/// Compare two byte strings without short-circuiting on the first mismatch.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"token", b"token"));
        assert!(!constant_time_eq(b"token", b"tokeN"));
        assert!(!constant_time_eq(b"token", b"token2"));
        assert!(constant_time_eq(b"", b""));
    }
}
