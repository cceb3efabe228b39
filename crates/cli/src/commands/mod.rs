//! Command implementations.

pub mod admin;
pub mod health;
pub mod markets;

use crate::client::ClientError;

/// Errors surfaced by any command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Unknown market: {0}")]
    UnknownMarket(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Storefront is unhealthy")]
    Unhealthy,
}

/// Print a JSON value for the operator.
#[allow(clippy::print_stdout)]
pub fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(_) => println!("{value}"),
    }
}
