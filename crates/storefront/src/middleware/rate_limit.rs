//! Per-client rate limiting with inspectable buckets.
//!
//! Each client gets a fixed-window counter per scope:
//! - `api`: JSON API endpoints (default 60 requests/minute)
//! - `auth`: login and registration submissions (default 10 requests/minute)
//!
//! Buckets live in a `moka` cache whose TTL is the window length, so an
//! expired entry is a reset window. Buckets are in-memory only and are lost
//! on restart. The admin API lists and clears them.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use moka::future::Cache;
use serde::Serialize;

use crate::config::RateLimitConfig;
use crate::error::AppError;
use crate::state::AppState;

/// Window length for every scope.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Upper bound on tracked buckets.
const MAX_BUCKETS: u64 = 100_000;

const LIMIT_HEADER: &str = "x-ratelimit-limit";
const REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Which limit a request counts against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitScope {
    Api,
    Auth,
}

impl RateLimitScope {
    pub const ALL: [Self; 2] = [Self::Api, Self::Auth];
}

/// Outcome of counting a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { limit: u32, remaining: u32 },
    Limited { limit: u32, retry_after: u64 },
}

/// A live bucket, as reported by the admin API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketSnapshot {
    pub key: String,
    pub scope: RateLimitScope,
    pub count: u32,
    pub limit: u32,
    pub resets_in_secs: u64,
}

#[derive(Debug)]
struct Bucket {
    count: AtomicU32,
    started: Instant,
}

impl Bucket {
    fn new() -> Self {
        Self {
            count: AtomicU32::new(0),
            started: Instant::now(),
        }
    }

    fn resets_in(&self, window: Duration) -> Duration {
        window.saturating_sub(self.started.elapsed())
    }
}

type BucketKey = (RateLimitScope, String);

/// Fixed-window rate limiter keyed by client identifier and scope.
#[derive(Clone)]
pub struct RateLimiter {
    buckets: Cache<BucketKey, Arc<Bucket>>,
    limits: RateLimitConfig,
    window: Duration,
}

impl RateLimiter {
    /// Create a limiter with the standard one minute window.
    #[must_use]
    pub fn new(limits: RateLimitConfig) -> Self {
        Self::with_window(limits, WINDOW)
    }

    /// Create a limiter with a custom window.
    #[must_use]
    pub fn with_window(limits: RateLimitConfig, window: Duration) -> Self {
        let buckets = Cache::builder()
            .max_capacity(MAX_BUCKETS)
            .time_to_live(window)
            .build();

        Self {
            buckets,
            limits,
            window,
        }
    }

    /// Requests allowed per window in `scope`.
    #[must_use]
    pub const fn limit(&self, scope: RateLimitScope) -> u32 {
        match scope {
            RateLimitScope::Api => self.limits.api_per_minute,
            RateLimitScope::Auth => self.limits.auth_per_minute,
        }
    }

    /// Count a request from `key` and decide whether it may proceed.
    pub async fn check(&self, key: &str, scope: RateLimitScope) -> Decision {
        let limit = self.limit(scope);
        let bucket = self
            .buckets
            .get_with((scope, key.to_string()), async { Arc::new(Bucket::new()) })
            .await;

        let count = bucket.count.fetch_add(1, Ordering::Relaxed).saturating_add(1);
        if count > limit {
            let retry_after = bucket.resets_in(self.window).as_secs().max(1);
            return Decision::Limited { limit, retry_after };
        }

        Decision::Allowed {
            limit,
            remaining: limit - count,
        }
    }

    /// Live buckets, sorted by key then scope.
    #[must_use]
    pub fn snapshot(&self) -> Vec<BucketSnapshot> {
        let mut buckets: Vec<BucketSnapshot> = self
            .buckets
            .iter()
            .filter(|(_, bucket)| bucket.started.elapsed() < self.window)
            .map(|(key, bucket)| {
                let (scope, client) = key.as_ref();
                BucketSnapshot {
                    key: client.clone(),
                    scope: *scope,
                    count: bucket.count.load(Ordering::Relaxed),
                    limit: self.limit(*scope),
                    resets_in_secs: bucket.resets_in(self.window).as_secs(),
                }
            })
            .collect();

        buckets.sort_by(|a, b| {
            a.key
                .cmp(&b.key)
                .then_with(|| (a.scope as u8).cmp(&(b.scope as u8)))
        });
        buckets
    }

    /// Clear every bucket for one client. Returns how many were removed.
    pub async fn clear(&self, key: &str) -> usize {
        let mut removed = 0;
        for scope in RateLimitScope::ALL {
            if self.buckets.remove(&(scope, key.to_string())).await.is_some() {
                removed += 1;
            }
        }
        removed
    }

    /// Clear every bucket. Returns how many were live.
    pub async fn clear_all(&self) -> usize {
        let live = self.snapshot().len();
        self.buckets.invalidate_all();
        self.buckets.run_pending_tasks().await;
        live
    }
}

/// Identify the client behind Cloudflare and Fly.io proxies.
///
/// Checks `CF-Connecting-IP`, the first `X-Forwarded-For` hop, `X-Real-IP`
/// and `Fly-Client-IP` in that order, then the socket address.
#[must_use]
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    header("cf-connecting-ip")
        .or_else(|| {
            header("x-forwarded-for")
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        })
        .or_else(|| header("x-real-ip"))
        .or_else(|| header("fly-client-ip"))
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

async fn enforce(limiter: &RateLimiter, scope: RateLimitScope, req: Request, next: Next) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(req.headers(), peer);

    match limiter.check(&key, scope).await {
        Decision::Allowed { limit, remaining } => {
            let mut response = next.run(req).await;
            let headers = response.headers_mut();
            headers.insert(LIMIT_HEADER, HeaderValue::from(limit));
            headers.insert(REMAINING_HEADER, HeaderValue::from(remaining));
            response
        }
        Decision::Limited { limit, retry_after } => {
            tracing::warn!(client = %key, scope = ?scope, retry_after, "Rate limit exceeded");
            let mut response = AppError::RateLimited(retry_after).into_response();
            let headers = response.headers_mut();
            headers.insert(LIMIT_HEADER, HeaderValue::from(limit));
            headers.insert(REMAINING_HEADER, HeaderValue::from(0u32));
            response
        }
    }
}

/// Middleware for the `api` scope.
pub async fn api_rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    enforce(state.rate_limiter(), RateLimitScope::Api, req, next).await
}

/// Middleware for the `auth` scope. Only form submissions are counted.
pub async fn auth_rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if req.method() != axum::http::Method::POST {
        return next.run(req).await;
    }
    enforce(state.rate_limiter(), RateLimitScope::Auth, req, next).await
}
