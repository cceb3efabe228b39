//! Indecisive Wear CLI - Operator tools for a running storefront.
//!
//! # Usage
//!
//! ```bash
//! # Liveness and dependency checks
//! iw-cli health
//! iw-cli health --deep
//!
//! # Rate limit buckets (needs ADMIN_API_TOKEN)
//! iw-cli rate-limits list
//! iw-cli rate-limits clear --key 203.0.113.7
//!
//! # Catalog cache (needs ADMIN_API_TOKEN)
//! iw-cli cache clear --product linen-shirt
//!
//! # Offline price conversion with the storefront's rate table
//! iw-cli markets list
//! iw-cli markets convert 48.00 USD --market gb
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_URL` - Base URL of the storefront (default: `http://localhost:3000`)
//! - `ADMIN_API_TOKEN` - Bearer token for `/api/admin/*`
//! - `CRON_SECRET` - Bearer token for `/api/cron/health-check`, if the deployment sets one

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use url::Url;

mod client;
mod commands;

#[derive(Parser)]
#[command(name = "iw-cli")]
#[command(author, version, about = "Indecisive Wear operator tools")]
struct Cli {
    /// Storefront base URL
    #[arg(long, global = true, env = "STOREFRONT_URL", default_value = "http://localhost:3000")]
    url: Url,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the storefront is up
    Health {
        /// Also probe Shopify and Instagram through the cron health check
        #[arg(long)]
        deep: bool,
    },
    /// Inspect or clear rate limit buckets
    RateLimits {
        #[command(subcommand)]
        action: RateLimitAction,
    },
    /// Drop cached catalog responses
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Markets and price conversion
    Markets {
        #[command(subcommand)]
        action: MarketAction,
    },
}

#[derive(Subcommand)]
enum RateLimitAction {
    /// List live buckets
    List,
    /// Clear every bucket, or only those of one client
    Clear {
        /// Client key as shown by `rate-limits list`
        #[arg(short, long)]
        key: Option<String>,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Clear the whole cache, one product or one collection
    Clear {
        /// Product handle
        #[arg(long, conflicts_with = "collection")]
        product: Option<String>,

        /// Collection handle
        #[arg(long)]
        collection: Option<String>,
    },
}

#[derive(Subcommand)]
enum MarketAction {
    /// List supported markets
    List,
    /// Convert an amount into a market's display currency
    Convert {
        /// Amount, e.g. `48.00`
        amount: String,

        /// Source currency code
        #[arg(default_value = "USD")]
        currency: String,

        /// Target market id (`us`, `gb`, `eu`, ...)
        #[arg(short, long)]
        market: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "indecisive_wear_cli=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Health { deep } => commands::health::check(&cli.url, deep).await,
        Commands::RateLimits { action } => match action {
            RateLimitAction::List => commands::admin::list_rate_limits(&cli.url).await,
            RateLimitAction::Clear { key } => {
                commands::admin::clear_rate_limits(&cli.url, key.as_deref()).await
            }
        },
        Commands::Cache { action } => match action {
            CacheAction::Clear {
                product,
                collection,
            } => {
                let target = match (product, collection) {
                    (Some(handle), _) => commands::admin::CacheTarget::Product(handle),
                    (None, Some(handle)) => commands::admin::CacheTarget::Collection(handle),
                    (None, None) => commands::admin::CacheTarget::All,
                };
                commands::admin::clear_cache(&cli.url, &target).await
            }
        },
        Commands::Markets { action } => match action {
            MarketAction::List => {
                commands::markets::list();
                Ok(())
            }
            MarketAction::Convert {
                amount,
                currency,
                market,
            } => commands::markets::convert(&amount, &currency, &market),
        },
    }
}
