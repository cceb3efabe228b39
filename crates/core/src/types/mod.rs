//! Core types for the Indecisive Wear storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod market;
pub mod money;

pub use email::{Email, EmailError};
pub use id::*;
pub use market::{DisplayPrice, MARKETS, Market, approximate_usd_rate};
pub use money::{CurrencyCode, Locale, MoneyError, Price};
