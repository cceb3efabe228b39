//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction per route)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP, frame and isolation policies)
//! 5. Session layer (tower-sessions with in-memory store)
//! 6. Rate limiting (`api` on `/api`, `auth` on login and register)
//! 7. Error pages (HTML rendering of page route errors)

pub mod admin;
pub mod customer;
pub mod error_pages;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use admin::RequireAdminToken;
pub use customer::{OptionalCustomer, RequireCustomer};
pub use error_pages::render_error_pages;
pub use rate_limit::{RateLimiter, api_rate_limit, auth_rate_limit};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
