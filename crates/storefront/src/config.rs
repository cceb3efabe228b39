//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `SHOPIFY_STORE` - Shopify store domain (e.g., indecisive-wear.myshopify.com)
//! - `SHOPIFY_STOREFRONT_PUBLIC_TOKEN` - Storefront API public access token
//! - `SHOPIFY_STOREFRONT_PRIVATE_TOKEN` - Storefront API private access token
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `SHOPIFY_API_VERSION` - API version (default: 2026-01)
//! - `INSTAGRAM_ACCESS_TOKEN` / `INSTAGRAM_USER_ID` - Instagram Graph API credentials
//! - `INSTAGRAM_API_BASE` - Graph API base URL (default: <https://graph.instagram.com>)
//! - `ADMIN_API_TOKEN` - Bearer token for `/api/admin/*` (disabled when unset)
//! - `CRON_SECRET` - Bearer token required by `/api/cron/health-check` when set
//! - `RATE_LIMIT_API_PER_MINUTE` - API requests per client per minute (default: 60)
//! - `RATE_LIMIT_AUTH_PER_MINUTE` - Login/register attempts per client per minute (default: 10)
//! - `DEFAULT_MARKET` - Market id used for new visitors (default: us)
//! - `CONTENT_DIR` - Markdown pages directory (default: crates/storefront/content)
//! - `STATIC_DIR` - Static assets directory (default: crates/storefront/static)
//! - `LOG_FORMAT` - `pretty` (default) or `json`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use indecisive_wear_core::Market;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const MIN_ADMIN_TOKEN_LENGTH: usize = 24;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Storefront application configuration.
#[derive(Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: Url,
    /// Shopify Storefront API configuration
    pub shopify: ShopifyStorefrontConfig,
    /// Instagram feed configuration (feed disabled when `None`)
    pub instagram: Option<InstagramConfig>,
    /// Bearer token for the admin API (admin API disabled when `None`)
    pub admin_api_token: Option<SecretString>,
    /// Bearer token for the cron health check (open when `None`)
    pub cron_secret: Option<SecretString>,
    /// Per-client rate limits
    pub rate_limits: RateLimitConfig,
    /// Market shown to visitors who have not picked one
    pub default_market: &'static Market,
    /// Markdown content directory
    pub content_dir: PathBuf,
    /// Static asset directory
    pub static_dir: PathBuf,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("base_url", &self.base_url.as_str())
            .field("shopify", &self.shopify)
            .field("instagram", &self.instagram)
            .field(
                "admin_api_token",
                &self.admin_api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("cron_secret", &self.cron_secret.as_ref().map(|_| "[REDACTED]"))
            .field("rate_limits", &self.rate_limits)
            .field("default_market", &self.default_market.id)
            .field("content_dir", &self.content_dir)
            .field("static_dir", &self.static_dir)
            .field("log_format", &self.log_format)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

/// Shopify Storefront API configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct ShopifyStorefrontConfig {
    /// Shopify store domain (e.g., indecisive-wear.myshopify.com)
    pub store: String,
    /// Shopify API version (e.g., 2026-01)
    pub api_version: String,
    /// Storefront API public access token (safe to expose in browser)
    pub storefront_public_token: String,
    /// Storefront API private access token (server-side only)
    pub storefront_private_token: SecretString,
}

impl std::fmt::Debug for ShopifyStorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyStorefrontConfig")
            .field("store", &self.store)
            .field("api_version", &self.api_version)
            .field("storefront_public_token", &self.storefront_public_token)
            .field("storefront_private_token", &"[REDACTED]")
            .finish()
    }
}

impl ShopifyStorefrontConfig {
    /// GraphQL endpoint for the configured store.
    ///
    /// A store value carrying an explicit scheme (`http://127.0.0.1:8080`)
    /// is used as the origin verbatim, which lets local proxies and mock
    /// servers stand in for Shopify.
    #[must_use]
    pub fn endpoint(&self) -> String {
        let origin = if self.store.starts_with("http://") || self.store.starts_with("https://") {
            self.store.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", self.store)
        };
        format!("{origin}/api/{}/graphql.json", self.api_version)
    }
}

/// Instagram Graph API configuration.
#[derive(Clone)]
pub struct InstagramConfig {
    /// Long-lived Graph API access token
    pub access_token: SecretString,
    /// Instagram business/creator account id
    pub user_id: String,
    /// Graph API base URL
    pub api_base: String,
}

impl std::fmt::Debug for InstagramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstagramConfig")
            .field("access_token", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Requests allowed per client per minute, by scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub api_per_minute: u32,
    pub auth_per_minute: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            api_per_minute: 60,
            auth_per_minute: 10,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`StorefrontConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(&lookup);

        let host = env
            .or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string()))?;
        let port = env.parsed_or("STOREFRONT_PORT", 3000_u16)?;
        let base_url = Url::parse(&env.required("STOREFRONT_BASE_URL")?).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;

        let shopify = ShopifyStorefrontConfig {
            store: env.required("SHOPIFY_STORE")?,
            api_version: env.or_default("SHOPIFY_API_VERSION", "2026-01"),
            storefront_public_token: env.required("SHOPIFY_STOREFRONT_PUBLIC_TOKEN")?,
            storefront_private_token: env.validated_secret("SHOPIFY_STOREFRONT_PRIVATE_TOKEN")?,
        };

        let instagram = match (
            env.optional("INSTAGRAM_ACCESS_TOKEN"),
            env.optional("INSTAGRAM_USER_ID"),
        ) {
            (Some(token), Some(user_id)) => Some(InstagramConfig {
                access_token: SecretString::from(token),
                user_id,
                api_base: env.or_default("INSTAGRAM_API_BASE", "https://graph.instagram.com"),
            }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::MissingEnvVar("INSTAGRAM_USER_ID".to_string()));
            }
            (None, Some(_)) => {
                return Err(ConfigError::MissingEnvVar(
                    "INSTAGRAM_ACCESS_TOKEN".to_string(),
                ));
            }
        };

        let admin_api_token = match env.optional("ADMIN_API_TOKEN") {
            Some(token) => {
                validate_admin_token(&token, "ADMIN_API_TOKEN")?;
                Some(SecretString::from(token))
            }
            None => None,
        };
        let cron_secret = env.optional("CRON_SECRET").map(SecretString::from);

        let rate_limits = RateLimitConfig {
            api_per_minute: env.parsed_or("RATE_LIMIT_API_PER_MINUTE", 60_u32)?,
            auth_per_minute: env.parsed_or("RATE_LIMIT_AUTH_PER_MINUTE", 10_u32)?,
        };
        if rate_limits.api_per_minute == 0 || rate_limits.auth_per_minute == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "RATE_LIMIT_*_PER_MINUTE".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let market_id = env.or_default("DEFAULT_MARKET", "us");
        let default_market = Market::find(&market_id).ok_or_else(|| {
            ConfigError::InvalidEnvVar(
                "DEFAULT_MARKET".to_string(),
                format!("unknown market '{market_id}'"),
            )
        })?;

        let log_format = match env.or_default("LOG_FORMAT", "pretty").as_str() {
            "json" => LogFormat::Json,
            "pretty" | "text" => LogFormat::Pretty,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "LOG_FORMAT".to_string(),
                    format!("expected 'pretty' or 'json', got '{other}'"),
                ));
            }
        };

        Ok(Self {
            host,
            port,
            base_url,
            shopify,
            instagram,
            admin_api_token,
            cron_secret,
            rate_limits,
            default_market,
            content_dir: PathBuf::from(env.or_default("CONTENT_DIR", "crates/storefront/content")),
            static_dir: PathBuf::from(env.or_default("STATIC_DIR", "crates/storefront/static")),
            log_format,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies must carry the `Secure` attribute.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup wrapper with the usual required/optional/default helpers.
struct Env<'a, F>(&'a F);

impl<F> Env<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable; blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parsed_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }

    /// Load and validate a secret.
    fn validated_secret(&self, key: &str) -> Result<SecretString, ConfigError> {
        let value = self.required(key)?;
        validate_secret_strength(&value, key)?;
        Ok(SecretString::from(value))
    }
}

/// Validate that the admin token is long enough and not a placeholder.
fn validate_admin_token(token: &str, var_name: &str) -> Result<(), ConfigError> {
    if token.len() < MIN_ADMIN_TOKEN_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {MIN_ADMIN_TOKEN_LENGTH} characters (got {})",
                token.len()
            ),
        ));
    }
    validate_secret_strength(token, var_name)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Compare a presented secret against the configured one in constant time.
#[must_use]
pub fn secret_matches(expected: &SecretString, presented: &str) -> bool {
    constant_time_eq(expected.expose_secret().as_bytes(), presented.as_bytes())
}

/// Constant-time byte comparison.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn base_vars() -> HashMap<&'static str, String> {
        HashMap::from([
            ("STOREFRONT_BASE_URL", "https://indecisivewear.com".to_string()),
            ("SHOPIFY_STORE", "indecisive-wear.myshopify.com".to_string()),
            ("SHOPIFY_STOREFRONT_PUBLIC_TOKEN", "public".to_string()),
            (
                "SHOPIFY_STOREFRONT_PRIVATE_TOKEN",
                test_support::TEST_PRIVATE_TOKEN.to_string(),
            ),
        ])
    }

    fn load(vars: &HashMap<&'static str, String>) -> Result<StorefrontConfig, ConfigError> {
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let err = validate_secret_strength("your-api-key-here", "TEST_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_admin_token_too_short() {
        assert!(validate_admin_token("aB3$xY9!", "ADMIN_API_TOKEN").is_err());
        assert!(validate_admin_token(test_support::TEST_ADMIN_TOKEN, "ADMIN_API_TOKEN").is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = load(&base_vars()).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.rate_limits, RateLimitConfig::default());
        assert_eq!(config.default_market.id, "us");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.instagram.is_none());
        assert!(config.admin_api_token.is_none());
        assert!(config.is_https());
        assert_eq!(
            config.shopify.endpoint(),
            "https://indecisive-wear.myshopify.com/api/2026-01/graphql.json"
        );
    }

    #[test]
    fn test_missing_required() {
        let mut vars = base_vars();
        vars.remove("SHOPIFY_STORE");
        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "SHOPIFY_STORE"));
    }

    #[test]
    fn test_instagram_requires_both_values() {
        let mut vars = base_vars();
        vars.insert("INSTAGRAM_ACCESS_TOKEN", "IGQVJ-token".to_string());
        assert!(load(&vars).is_err());

        vars.insert("INSTAGRAM_USER_ID", "178414".to_string());
        let config = load(&vars).unwrap();
        let instagram = config.instagram.unwrap();
        assert_eq!(instagram.user_id, "178414");
        assert_eq!(instagram.api_base, "https://graph.instagram.com");
    }

    #[test]
    fn test_unknown_default_market() {
        let mut vars = base_vars();
        vars.insert("DEFAULT_MARKET", "mars".to_string());
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::InvalidEnvVar(_, _)
        ));
    }

    #[test]
    fn test_explicit_scheme_endpoint() {
        let mut vars = base_vars();
        vars.insert("SHOPIFY_STORE", "http://127.0.0.1:9000/".to_string());
        let config = load(&vars).unwrap();
        assert_eq!(
            config.shopify.endpoint(),
            "http://127.0.0.1:9000/api/2026-01/graphql.json"
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut vars = base_vars();
        vars.insert("ADMIN_API_TOKEN", test_support::TEST_ADMIN_TOKEN.to_string());
        let config = load(&vars).unwrap();
        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("indecisive-wear.myshopify.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains(test_support::TEST_PRIVATE_TOKEN));
        assert!(!debug_output.contains(test_support::TEST_ADMIN_TOKEN));
    }

    #[test]
    fn test_secret_matches() {
        let secret = SecretString::from("s3cr3t-value");
        assert!(secret_matches(&secret, "s3cr3t-value"));
        assert!(!secret_matches(&secret, "s3cr3t-valuX"));
        assert!(!secret_matches(&secret, "short"));
    }
}
