//! Health check command.
//!
//! Without `--deep` this hits `/api/health`, which never touches Shopify.
//! With `--deep` it runs the cron health check, sending `CRON_SECRET` when
//! set, and fails if any dependency probe failed.

use reqwest::{Method, StatusCode};
use secrecy::SecretString;
use url::Url;

use super::{CommandError, print_json};
use crate::client::StorefrontClient;

/// Check a deployment and print the response.
///
/// # Errors
///
/// Returns an error if the storefront is unreachable or reports degraded.
pub async fn check(base: &Url, deep: bool) -> Result<(), CommandError> {
    if deep {
        let secret = std::env::var("CRON_SECRET").ok().map(SecretString::from);
        let client = StorefrontClient::new(base, secret)?;
        let response = client
            .send(
                Method::GET,
                "/api/cron/health-check",
                &[StatusCode::SERVICE_UNAVAILABLE],
            )
            .await?;
        print_json(&response.body);
        if response.status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(CommandError::Unhealthy);
        }
    } else {
        let client = StorefrontClient::new(base, None)?;
        let response = client.send(Method::GET, "/api/health", &[]).await?;
        print_json(&response.body);
    }
    tracing::info!(url = %base, "Storefront is healthy");
    Ok(())
}
