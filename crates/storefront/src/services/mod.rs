//! Services beyond the Shopify client.
//!
//! - `instagram` - Instagram Graph API feed
//! - `health` - dependency probes for the cron health check

pub mod health;
pub mod instagram;
