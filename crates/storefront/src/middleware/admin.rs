//! Bearer-token guard for the admin API.
//!
//! `/api/admin/*` is only reachable when `ADMIN_API_TOKEN` is configured.
//! Without it the endpoints pretend not to exist.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};

use crate::config::secret_matches;
use crate::error::AppError;
use crate::state::AppState;

/// Extractor that requires `Authorization: Bearer <ADMIN_API_TOKEN>`.
///
/// Rejects with 404 when no admin token is configured and 401 when the
/// presented token is missing or wrong.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdminToken;

/// The token from an `Authorization: Bearer` header.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

impl<S> FromRequestParts<S> for RequireAdminToken
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let Some(expected) = state.config().admin_api_token.as_ref() else {
            return Err(AppError::NotFound("admin API is disabled".to_string()));
        };

        match bearer_token(&parts.headers) {
            Some(presented) if secret_matches(expected, presented) => Ok(Self),
            _ => {
                tracing::warn!(path = %parts.uri.path(), "Rejected admin API request");
                Err(AppError::Unauthorized("Invalid admin token".to_string()))
            }
        }
    }
}
