//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::content::{ContentError, ContentStore};
use crate::middleware::RateLimiter;
use crate::services::instagram::InstagramClient;
use crate::shopify::StorefrontClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the API clients, rate limiter, content and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    storefront: StorefrontClient,
    instagram: Option<InstagramClient>,
    rate_limiter: RateLimiter,
    content: ContentStore,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the content directory exists but cannot be read.
    pub fn new(config: StorefrontConfig) -> Result<Self, ContentError> {
        let content = ContentStore::load(&config.content_dir)?;
        Ok(Self::with_content(config, content))
    }

    /// Create a new application state with already loaded content.
    #[must_use]
    pub fn with_content(config: StorefrontConfig, content: ContentStore) -> Self {
        let storefront = StorefrontClient::new(&config.shopify);
        let instagram = config.instagram.as_ref().map(InstagramClient::new);
        let rate_limiter = RateLimiter::new(config.rate_limits);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                storefront,
                instagram,
                rate_limiter,
                content,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the Shopify Storefront API client.
    #[must_use]
    pub fn storefront(&self) -> &StorefrontClient {
        &self.inner.storefront
    }

    /// The Instagram client, when the feed is configured.
    #[must_use]
    pub fn instagram(&self) -> Option<&InstagramClient> {
        self.inner.instagram.as_ref()
    }

    /// Get a reference to the per-client rate limiter.
    #[must_use]
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.inner.rate_limiter
    }

    /// Get a reference to the markdown pages.
    #[must_use]
    pub fn content(&self) -> &ContentStore {
        &self.inner.content
    }
}
