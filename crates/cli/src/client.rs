//! Minimal HTTP client for the storefront's JSON endpoints.

use std::time::Duration;

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use url::Url;

const TIMEOUT: Duration = Duration::from_secs(15);

/// Errors talking to the storefront.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid URL path {0}: {1}")]
    Url(String, url::ParseError),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{status}: {message}")]
    Status { status: StatusCode, message: String },
}

/// A JSON response with its status.
#[derive(Debug)]
pub struct JsonResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Client for one storefront deployment.
pub struct StorefrontClient {
    http: reqwest::Client,
    base: Url,
    token: Option<SecretString>,
}

impl StorefrontClient {
    /// Create a client, optionally sending `token` as a bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base: &Url, token: Option<SecretString>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(TIMEOUT)
            .user_agent(concat!("iw-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base: base.clone(),
            token,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base
            .join(path)
            .map_err(|e| ClientError::Url(path.to_string(), e))
    }

    /// Send a request and decode the JSON body.
    ///
    /// Responses listed in `accept` are returned even when they are not 2xx,
    /// so the health check can report a 503 body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or an unexpected status.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        accept: &[StatusCode],
    ) -> Result<JsonResponse, ClientError> {
        let url = self.endpoint(path)?;
        tracing::debug!(%method, %url, "Sending request");

        let mut request = self.http.request(method, url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NO_CONTENT {
            return Ok(JsonResponse {
                status,
                body: Value::Null,
            });
        }

        let text = response.text().await?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        if status.is_success() || accept.contains(&status) {
            Ok(JsonResponse { status, body })
        } else {
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .map_or_else(|| body.to_string(), ToString::to_string);
            Err(ClientError::Status { status, message })
        }
    }
}

/// Percent-encode one path segment.
pub fn segment(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use reqwest::Method;

    fn client(server: &MockServer, token: Option<&str>) -> StorefrontClient {
        let base = Url::parse(&server.base_url()).unwrap();
        StorefrontClient::new(&base, token.map(SecretString::from)).unwrap()
    }

    #[tokio::test]
    async fn test_sends_bearer_token() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/admin/rate-limits")
                .header("authorization", "Bearer secret-token");
            then.status(200).json_body(json!({ "buckets": [] }));
        });

        let response = client(&server, Some("secret-token"))
            .send(Method::GET, "/api/admin/rate-limits", &[])
            .await
            .unwrap();
        assert_eq!(response.body["buckets"], json!([]));
        mock.assert();
    }

    #[tokio::test]
    async fn test_error_body_becomes_message() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.path("/api/admin/cache");
            then.status(401).json_body(json!({ "error": "Invalid admin token" }));
        });

        let err = client(&server, None)
            .send(Method::DELETE, "/api/admin/cache", &[])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "401 Unauthorized: Invalid admin token");
    }

    #[tokio::test]
    async fn test_accepted_error_status_is_returned() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.path("/api/cron/health-check");
            then.status(503).json_body(json!({ "status": "degraded" }));
        });

        let response = client(&server, None)
            .send(
                Method::GET,
                "/api/cron/health-check",
                &[StatusCode::SERVICE_UNAVAILABLE],
            )
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.body["status"], "degraded");
    }

    #[test]
    fn test_segment() {
        assert_eq!(segment("linen-shirt"), "linen-shirt");
        assert_eq!(segment("a b/c"), "a%20b%2Fc");
    }
}
