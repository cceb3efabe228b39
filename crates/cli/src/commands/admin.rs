//! Admin API commands: rate limit buckets and the catalog cache.
//!
//! All of these need `ADMIN_API_TOKEN`, matching the token the storefront
//! was started with.

use reqwest::Method;
use secrecy::SecretString;
use url::Url;

use super::{CommandError, print_json};
use crate::client::{StorefrontClient, segment};

/// What to drop from the catalog cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheTarget {
    All,
    Product(String),
    Collection(String),
}

impl CacheTarget {
    fn path(&self) -> String {
        match self {
            Self::All => "/api/admin/cache".to_string(),
            Self::Product(handle) => format!("/api/admin/cache/products/{}", segment(handle)),
            Self::Collection(handle) => {
                format!("/api/admin/cache/collections/{}", segment(handle))
            }
        }
    }
}

fn admin_client(base: &Url) -> Result<StorefrontClient, CommandError> {
    let token = std::env::var("ADMIN_API_TOKEN")
        .map_err(|_| CommandError::MissingEnvVar("ADMIN_API_TOKEN"))?;
    Ok(StorefrontClient::new(base, Some(SecretString::from(token)))?)
}

/// Print live rate limit buckets.
///
/// # Errors
///
/// Returns an error if the token is missing or the request fails.
pub async fn list_rate_limits(base: &Url) -> Result<(), CommandError> {
    let response = admin_client(base)?
        .send(Method::GET, "/api/admin/rate-limits", &[])
        .await?;
    print_json(&response.body);
    Ok(())
}

/// Clear every bucket, or those of one client key.
///
/// # Errors
///
/// Returns an error if the token is missing or the request fails.
pub async fn clear_rate_limits(base: &Url, key: Option<&str>) -> Result<(), CommandError> {
    let path = key.map_or_else(
        || "/api/admin/rate-limits".to_string(),
        |key| format!("/api/admin/rate-limits/{}", segment(key)),
    );
    let response = admin_client(base)?.send(Method::DELETE, &path, &[]).await?;
    tracing::info!(cleared = %response.body["cleared"], "Rate limit buckets cleared");
    Ok(())
}

/// Drop cached catalog responses.
///
/// # Errors
///
/// Returns an error if the token is missing or the request fails.
pub async fn clear_cache(base: &Url, target: &CacheTarget) -> Result<(), CommandError> {
    admin_client(base)?
        .send(Method::DELETE, &target.path(), &[])
        .await?;
    tracing::info!(?target, "Cache cleared");
    Ok(())
}
