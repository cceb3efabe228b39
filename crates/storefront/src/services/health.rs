//! Dependency health probes.
//!
//! Each probe runs with a fixed 5 second timeout. Shopify is always probed;
//! Instagram only when configured.

use std::future::Future;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::AppState;

/// Per-probe timeout.
pub const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Crate version reported by health endpoints.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Outcome of one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Error,
    Skipped,
}

/// Result of probing one dependency.
#[derive(Debug, Clone, Serialize)]
pub struct DependencyCheck {
    pub name: &'static str,
    pub status: CheckStatus,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Overall report for `/api/cron/health-check`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// `ok` when every probe passed or was skipped, `degraded` otherwise.
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
    pub checks: Vec<DependencyCheck>,
}

impl HealthReport {
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.checks.iter().all(|c| c.status != CheckStatus::Error)
    }
}

/// Run `check` with the probe timeout and time it.
pub async fn probe<F, T, E>(name: &'static str, timeout: Duration, check: F) -> DependencyCheck
where
    F: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let started = Instant::now();
    let outcome = tokio::time::timeout(timeout, check).await;
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let (status, detail) = match outcome {
        Ok(Ok(_)) => (CheckStatus::Ok, None),
        Ok(Err(e)) => (CheckStatus::Error, Some(e.to_string())),
        Err(_) => (
            CheckStatus::Error,
            Some(format!("timed out after {}s", timeout.as_secs())),
        ),
    };

    if status == CheckStatus::Error {
        tracing::warn!(dependency = name, latency_ms, detail = ?detail, "Health check failed");
    }

    DependencyCheck {
        name,
        status,
        latency_ms,
        detail,
    }
}

fn skipped(name: &'static str, reason: &str) -> DependencyCheck {
    DependencyCheck {
        name,
        status: CheckStatus::Skipped,
        latency_ms: 0,
        detail: Some(reason.to_string()),
    }
}

/// Probe Shopify and Instagram.
pub async fn run_checks(state: &AppState) -> HealthReport {
    let shopify = probe("shopify", CHECK_TIMEOUT, state.storefront().shop_name());

    let instagram = async {
        match state.instagram() {
            Some(client) => probe("instagram", CHECK_TIMEOUT, client.ping()).await,
            None => skipped("instagram", "not configured"),
        }
    };

    let (shopify, instagram) = tokio::join!(shopify, instagram);
    let mut report = HealthReport {
        status: "ok",
        version: VERSION,
        timestamp: Utc::now(),
        checks: vec![shopify, instagram],
    };
    if !report.is_healthy() {
        report.status = "degraded";
    }
    report
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_probe_ok() {
        let check = probe("fast", CHECK_TIMEOUT, async { Ok::<_, String>(()) }).await;
        assert_eq!(check.status, CheckStatus::Ok);
        assert!(check.detail.is_none());
    }

    #[tokio::test]
    async fn test_probe_error() {
        let check = probe("broken", CHECK_TIMEOUT, async { Err::<(), _>("boom") }).await;
        assert_eq!(check.status, CheckStatus::Error);
        assert_eq!(check.detail.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_probe_timeout() {
        let check = probe("slow", Duration::from_millis(20), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, String>(())
        })
        .await;
        assert_eq!(check.status, CheckStatus::Error);
        assert!(check.detail.unwrap().contains("timed out"));
    }

    #[test]
    fn test_skipped_is_healthy() {
        let report = HealthReport {
            status: "ok",
            version: VERSION,
            timestamp: Utc::now(),
            checks: vec![skipped("instagram", "not configured")],
        };
        assert!(report.is_healthy());
    }
}
