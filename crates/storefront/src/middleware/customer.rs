//! Customer authentication extractors.
//!
//! The customer access token lives in the visitor session after sign-in.
//! Expired tokens are dropped and the visitor is treated as signed out.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tower_sessions::Session;

use crate::models::session;
use crate::shopify::CustomerAccessToken;

/// Login page for signed-out visitors.
pub const LOGIN_PATH: &str = "/account/login";

/// Extractor that requires a signed-in customer.
///
/// Page requests are redirected to the login form with a `redirect` back to
/// the original path; API requests get a bare 401.
///
/// # Example
///
/// ```rust,ignore
/// async fn account(RequireCustomer(token): RequireCustomer) -> impl IntoResponse {
///     let customer = state.storefront().get_customer(&token).await?;
/// }
/// ```
pub struct RequireCustomer(pub CustomerAccessToken);

/// Error returned when a customer is required but not signed in.
#[derive(Debug)]
pub enum CustomerRejection {
    /// Redirect to the login page (for HTML requests).
    RedirectToLogin(String),
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for CustomerRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(path) => Redirect::to(&path).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// Login URL that returns the visitor to `path` afterwards.
#[must_use]
pub fn login_redirect(path: &str) -> String {
    format!("{LOGIN_PATH}?redirect={}", urlencoding::encode(path))
}

/// Whether `target` is a same-site path that is safe to redirect to.
#[must_use]
pub fn is_local_path(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//") && !target.contains('\\')
}

impl<S> FromRequestParts<S> for RequireCustomer
where
    S: Send + Sync,
{
    type Rejection = CustomerRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map_or_else(|| parts.uri.path().to_string(), |OriginalUri(uri)| uri.path().to_string());
        let rejection = || {
            if path.starts_with("/api/") {
                CustomerRejection::Unauthorized
            } else {
                CustomerRejection::RedirectToLogin(login_redirect(&path))
            }
        };

        let session = parts.extensions.get::<Session>().ok_or_else(rejection)?;
        let token = session::customer_token(session, Utc::now())
            .await
            .ok_or_else(rejection)?;

        Ok(Self(token))
    }
}

/// Extractor that optionally gets the customer token.
///
/// Unlike `RequireCustomer`, this does not reject signed-out visitors.
pub struct OptionalCustomer(pub Option<CustomerAccessToken>);

impl<S> FromRequestParts<S> for OptionalCustomer
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = match parts.extensions.get::<Session>() {
            Some(session) => session::customer_token(session, Utc::now()).await,
            None => None,
        };

        Ok(Self(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_redirect_encodes_path() {
        assert_eq!(
            login_redirect("/account"),
            "/account/login?redirect=%2Faccount"
        );
    }

    #[test]
    fn test_is_local_path() {
        assert!(is_local_path("/account"));
        assert!(is_local_path("/products?sort=newest"));
        assert!(!is_local_path("//evil.example"));
        assert!(!is_local_path("https://evil.example"));
        assert!(!is_local_path("/\\evil.example"));
        assert!(!is_local_path(""));
    }
}
