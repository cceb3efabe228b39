//! Toast notifications and HTMX trigger events.
//!
//! HTMX responses raise client events through the `HX-Trigger` header:
//!
//! ```json
//! {"cart-updated": {"count": 3}, "toast": {"level": "success", "message": "Added to cart"}}
//! ```
//!
//! The layout listens for `cart-updated` / `wishlist-updated` to refresh the
//! header badges and for `toast` to show a notification. Full-page flows
//! (login, logout, register) push flash toasts into the session instead;
//! the next rendered page drains them.

use std::convert::Infallible;

use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponseParts, ResponseParts};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// HTMX response header for client-side events.
pub const HX_TRIGGER: &str = "hx-trigger";

/// Set by htmx on every request it issues.
pub const HX_REQUEST: &str = "hx-request";

/// Asks htmx to reload the whole page.
pub const HX_REFRESH: &str = "hx-refresh";

/// Whether the request was issued by htmx.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key(HX_REQUEST)
}

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Success,
    Info,
    Error,
}

impl ToastLevel {
    /// CSS modifier class.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Error => "error",
        }
    }
}

/// A user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Error,
            message: message.into(),
        }
    }
}

/// Events to raise on the client via `HX-Trigger`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HxTrigger {
    cart_count: Option<u32>,
    wishlist_count: Option<usize>,
    toast: Option<Toast>,
}

impl HxTrigger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise `cart-updated` with the new item count.
    #[must_use]
    pub const fn cart_updated(mut self, count: u32) -> Self {
        self.cart_count = Some(count);
        self
    }

    /// Raise `wishlist-updated` with the new item count.
    #[must_use]
    pub const fn wishlist_updated(mut self, count: usize) -> Self {
        self.wishlist_count = Some(count);
        self
    }

    /// Show a toast.
    #[must_use]
    pub fn toast(mut self, toast: Toast) -> Self {
        self.toast = Some(toast);
        self
    }

    /// The header payload, or `None` when there is nothing to raise.
    #[must_use]
    pub fn to_json(&self) -> Option<Value> {
        let mut events = Map::new();
        if let Some(count) = self.cart_count {
            events.insert("cart-updated".to_string(), json!({ "count": count }));
        }
        if let Some(count) = self.wishlist_count {
            events.insert("wishlist-updated".to_string(), json!({ "count": count }));
        }
        if let Some(toast) = &self.toast {
            events.insert("toast".to_string(), json!(toast));
        }
        (!events.is_empty()).then_some(Value::Object(events))
    }
}

impl IntoResponseParts for HxTrigger {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        if let Some(payload) = self.to_json()
            && let Ok(value) = HeaderValue::from_bytes(payload.to_string().as_bytes())
        {
            res.headers_mut().insert(HX_TRIGGER, value);
        }
        Ok(res)
    }
}
