//! Session-stored visitor state.
//!
//! Everything the storefront remembers about a visitor lives in the
//! server-side session: the Shopify cart id and its mirror, the wishlist,
//! recently viewed products, the selected market, the customer access token,
//! and pending flash toasts.
//!
//! The helpers here never fail. A session store error is logged and the
//! visitor sees default state, the same way a fresh visitor would.

use chrono::{DateTime, Utc};
use indecisive_wear_core::{CartMirror, Market, RecentlyViewed, RecentlyViewedProduct, Wishlist};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tower_sessions::Session;

use crate::notifications::Toast;
use crate::shopify::CustomerAccessToken;

/// Session keys.
pub mod keys {
    /// Shopify cart id.
    pub const CART_ID: &str = "cart_id";

    /// Mirror of the Shopify cart for cheap reads.
    pub const CART_MIRROR: &str = "cart_mirror";

    /// Saved products.
    pub const WISHLIST: &str = "wishlist";

    /// Recently viewed products.
    pub const RECENTLY_VIEWED: &str = "recently_viewed";

    /// Selected market id.
    pub const MARKET: &str = "market";

    /// Shopify customer access token.
    pub const CUSTOMER_TOKEN: &str = "customer_token";

    /// Toasts to show on the next rendered page.
    pub const FLASH: &str = "flash";
}

/// Customer access token as stored in the session.
#[derive(Clone, Serialize, Deserialize)]
struct StoredCustomerToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl From<&CustomerAccessToken> for StoredCustomerToken {
    fn from(token: &CustomerAccessToken) -> Self {
        Self {
            access_token: token.access_token.expose_secret().to_string(),
            expires_at: token.expires_at,
        }
    }
}

impl From<StoredCustomerToken> for CustomerAccessToken {
    fn from(stored: StoredCustomerToken) -> Self {
        Self {
            access_token: SecretString::from(stored.access_token),
            expires_at: stored.expires_at,
        }
    }
}

async fn read<T: DeserializeOwned>(session: &Session, key: &str) -> Option<T> {
    match session.get::<T>(key).await {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to read session value");
            None
        }
    }
}

async fn write<T: Serialize + Sync>(session: &Session, key: &str, value: &T) {
    if let Err(e) = session.insert(key, value).await {
        tracing::error!(key, error = %e, "Failed to write session value");
    }
}

async fn forget(session: &Session, key: &str) {
    if let Err(e) = session.remove_value(key).await {
        tracing::warn!(key, error = %e, "Failed to remove session value");
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The Shopify cart id, if the visitor has a cart.
pub async fn cart_id(session: &Session) -> Option<String> {
    read(session, keys::CART_ID).await
}

/// Remember the Shopify cart id.
pub async fn set_cart_id(session: &Session, cart_id: &str) {
    write(session, keys::CART_ID, &cart_id).await;
}

/// The mirrored cart, or an empty one.
pub async fn cart_mirror(session: &Session) -> CartMirror {
    read(session, keys::CART_MIRROR).await.unwrap_or_default()
}

/// Replace the mirrored cart.
pub async fn set_cart_mirror(session: &Session, mirror: &CartMirror) {
    write(session, keys::CART_MIRROR, mirror).await;
}

/// Forget the cart entirely (expired or completed cart).
pub async fn clear_cart(session: &Session) {
    forget(session, keys::CART_ID).await;
    forget(session, keys::CART_MIRROR).await;
}

// =============================================================================
// Saved lists
// =============================================================================

/// The visitor's wishlist.
pub async fn wishlist(session: &Session) -> Wishlist {
    read(session, keys::WISHLIST).await.unwrap_or_default()
}

/// Replace the wishlist.
pub async fn set_wishlist(session: &Session, wishlist: &Wishlist) {
    write(session, keys::WISHLIST, wishlist).await;
}

/// Recently viewed products, with entries older than 30 days pruned.
pub async fn recently_viewed(session: &Session, now: DateTime<Utc>) -> RecentlyViewed {
    let entries: Vec<RecentlyViewedProduct> =
        read(session, keys::RECENTLY_VIEWED).await.unwrap_or_default();
    RecentlyViewed::load(entries, now)
}

/// Replace the recently viewed list.
pub async fn set_recently_viewed(session: &Session, list: &RecentlyViewed) {
    write(session, keys::RECENTLY_VIEWED, list).await;
}

// =============================================================================
// Market
// =============================================================================

/// The selected market, or `fallback` when none (or an unknown one) is stored.
pub async fn market(session: &Session, fallback: &'static Market) -> &'static Market {
    read::<String>(session, keys::MARKET)
        .await
        .and_then(|id| Market::find(&id))
        .unwrap_or(fallback)
}

/// Remember the selected market.
pub async fn set_market(session: &Session, market: &Market) {
    write(session, keys::MARKET, &market.id).await;
}

// =============================================================================
// Customer
// =============================================================================

/// The signed-in customer's access token.
///
/// An expired token is removed and treated as signed out.
pub async fn customer_token(session: &Session, now: DateTime<Utc>) -> Option<CustomerAccessToken> {
    let token: CustomerAccessToken = read::<StoredCustomerToken>(session, keys::CUSTOMER_TOKEN)
        .await?
        .into();

    if token.is_expired(now) {
        tracing::debug!("Customer access token expired");
        forget(session, keys::CUSTOMER_TOKEN).await;
        return None;
    }
    Some(token)
}

/// Store the customer access token after sign-in.
pub async fn set_customer_token(session: &Session, token: &CustomerAccessToken) {
    write(session, keys::CUSTOMER_TOKEN, &StoredCustomerToken::from(token)).await;
}

/// Sign the customer out.
pub async fn clear_customer_token(session: &Session) {
    forget(session, keys::CUSTOMER_TOKEN).await;
}

// =============================================================================
// Flash toasts
// =============================================================================

/// Queue a toast for the next rendered page.
pub async fn push_flash(session: &Session, toast: Toast) {
    let mut pending: Vec<Toast> = read(session, keys::FLASH).await.unwrap_or_default();
    pending.push(toast);
    write(session, keys::FLASH, &pending).await;
}

/// Drain queued toasts.
pub async fn take_flash(session: &Session) -> Vec<Toast> {
    match session.remove::<Vec<Toast>>(keys::FLASH).await {
        Ok(pending) => pending.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read flash toasts");
            Vec::new()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;
    use indecisive_wear_core::{Price, ProductId, SavedProduct};
    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn saved(n: u64) -> SavedProduct {
        SavedProduct {
            id: ProductId::from_numeric(n),
            handle: format!("product-{n}"),
            title: format!("Product {n}"),
            image_url: None,
            price: Price::parse("20.00", "USD").unwrap(),
        }
    }

    #[tokio::test]
    async fn test_defaults_for_fresh_session() {
        let session = session();
        assert!(cart_id(&session).await.is_none());
        assert!(cart_mirror(&session).await.is_empty());
        assert!(wishlist(&session).await.is_empty());
        assert!(recently_viewed(&session, Utc::now()).await.is_empty());
        assert_eq!(market(&session, Market::default_market()).await.id, "us");
        assert!(customer_token(&session, Utc::now()).await.is_none());
        assert!(take_flash(&session).await.is_empty());
    }

    #[tokio::test]
    async fn test_cart_id_and_clear() {
        let session = session();
        set_cart_id(&session, "gid://shopify/Cart/c1").await;
        assert_eq!(cart_id(&session).await.as_deref(), Some("gid://shopify/Cart/c1"));

        clear_cart(&session).await;
        assert!(cart_id(&session).await.is_none());
    }

    #[tokio::test]
    async fn test_market_unknown_id_falls_back() {
        let session = session();
        session.insert(keys::MARKET, "atlantis").await.unwrap();
        let fallback = Market::find("gb").unwrap();
        assert_eq!(market(&session, fallback).await.id, "gb");

        set_market(&session, Market::find("fr").unwrap()).await;
        assert_eq!(market(&session, fallback).await.id, "fr");
    }

    #[tokio::test]
    async fn test_wishlist_persists() {
        let session = session();
        let mut list = wishlist(&session).await;
        list.add(saved(1)).unwrap();
        set_wishlist(&session, &list).await;

        assert!(wishlist(&session).await.contains(&ProductId::from_numeric(1)));
    }

    #[tokio::test]
    async fn test_recently_viewed_prunes_on_load() {
        let session = session();
        let now = Utc::now();
        let mut list = RecentlyViewed::default();
        list.record(saved(1), now - Duration::days(31));
        list.record(saved(2), now - Duration::days(1));
        set_recently_viewed(&session, &list).await;

        let loaded = recently_viewed(&session, now).await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.entries()[0].product.handle, "product-2");
    }

    #[tokio::test]
    async fn test_expired_customer_token_is_removed() {
        let session = session();
        let now = Utc::now();
        set_customer_token(
            &session,
            &CustomerAccessToken {
                access_token: SecretString::from("cat_old"),
                expires_at: now - Duration::minutes(1),
            },
        )
        .await;

        assert!(customer_token(&session, now).await.is_none());
        assert!(session.get::<serde_json::Value>(keys::CUSTOMER_TOKEN).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_valid_customer_token_round_trip() {
        let session = session();
        let now = Utc::now();
        set_customer_token(
            &session,
            &CustomerAccessToken {
                access_token: SecretString::from("cat_new"),
                expires_at: now + Duration::days(1),
            },
        )
        .await;

        assert_eq!(customer_token(&session, now).await.unwrap().token(), "cat_new");
    }

    #[tokio::test]
    async fn test_flash_is_drained_once() {
        let session = session();
        push_flash(&session, Toast::success("Signed in")).await;
        push_flash(&session, Toast::info("Welcome back")).await;

        let pending = take_flash(&session).await;
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].message, "Signed in");
        assert!(take_flash(&session).await.is_empty());
    }
}
