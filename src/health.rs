//! Health checks backing the `/health` liveness endpoint.
//!
//! Checks are registered on a [`HealthChecks`] registry and run on every probe. The probe
//! answers with the worst status any check reported; no registered checks means healthy.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Outcome of a health check, ordered from best to worst.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "Healthy",
            HealthStatus::Degraded => "Degraded",
            HealthStatus::Unhealthy => "Unhealthy",
        }
    }

    /// Degraded still serves traffic, so only `Unhealthy` maps to 503.
    pub fn status_code(&self) -> StatusCode {
        match self {
            HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result returned by a single [`HealthCheck`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HealthCheckResult {
    pub status: HealthStatus,
    pub description: Option<String>,
}

impl HealthCheckResult {
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            description: None,
        }
    }

    pub fn degraded(description: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Degraded,
            description: Some(description.into()),
        }
    }

    pub fn unhealthy(description: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            description: Some(description.into()),
        }
    }
}

/// A named probe contributing to the `/health` result.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    fn name(&self) -> &str;

    async fn check(&self) -> HealthCheckResult;
}

/// Registry of health checks shared with the router.
#[derive(Clone, Default)]
pub struct HealthChecks {
    checks: Vec<Arc<dyn HealthCheck>>,
}

impl HealthChecks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an additional check.
    pub fn with_check(mut self, check: impl HealthCheck + 'static) -> Self {
        self.checks.push(Arc::new(check));
        self
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Runs every registered check in registration order.
    pub async fn run(&self) -> HealthReport {
        let started = Instant::now();
        let mut entries = Vec::with_capacity(self.checks.len());

        for check in &self.checks {
            let check_started = Instant::now();
            let result = check.check().await;
            let duration = check_started.elapsed();

            tracing::debug!(
                check = check.name(),
                status = %result.status,
                duration_ms = millis(duration),
                "health check completed"
            );
            if result.status == HealthStatus::Unhealthy {
                tracing::warn!(
                    check = check.name(),
                    description = result.description.as_deref().unwrap_or_default(),
                    "health check failed"
                );
            }

            entries.push(HealthReportEntry {
                name: check.name().to_owned(),
                status: result.status,
                description: result.description,
                duration,
            });
        }

        let status = entries
            .iter()
            .map(|entry| entry.status)
            .max()
            .unwrap_or(HealthStatus::Healthy);

        let total_duration = started.elapsed();
        tracing::debug!(
            %status,
            checks = entries.len(),
            duration_ms = millis(total_duration),
            "health report"
        );

        HealthReport {
            status,
            entries,
            total_duration,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl fmt::Debug for HealthChecks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.checks.iter().map(|check| check.name()))
            .finish()
    }
}

/// Aggregate result of one run over all registered checks.
#[derive(Clone, Debug)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub entries: Vec<HealthReportEntry>,
    pub total_duration: Duration,
}

#[derive(Clone, Debug)]
pub struct HealthReportEntry {
    pub name: String,
    pub status: HealthStatus,
    pub description: Option<String>,
    pub duration: Duration,
}

impl IntoResponse for HealthReport {
    fn into_response(self) -> Response {
        (self.status.status_code(), self.status.as_str()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::capture_logs;

    struct StaticCheck {
        name: &'static str,
        result: HealthCheckResult,
    }

    #[async_trait]
    impl HealthCheck for StaticCheck {
        fn name(&self) -> &str {
            self.name
        }

        async fn check(&self) -> HealthCheckResult {
            self.result.clone()
        }
    }

    #[tokio::test]
    async fn empty_registry_is_healthy() {
        let report = HealthChecks::new().run().await;

        assert_eq!(report.status, HealthStatus::Healthy);
        assert!(report.entries.is_empty());
    }

    #[tokio::test]
    async fn worst_status_wins() {
        let checks = HealthChecks::new()
            .with_check(StaticCheck {
                name: "db",
                result: HealthCheckResult::healthy(),
            })
            .with_check(StaticCheck {
                name: "cache",
                result: HealthCheckResult::degraded("slow"),
            });
        assert_eq!(checks.len(), 2);

        let report = checks.run().await;
        assert_eq!(report.status, HealthStatus::Degraded);
        assert_eq!(report.entries[1].name, "cache");
        assert_eq!(report.entries[1].description.as_deref(), Some("slow"));

        let report = checks
            .with_check(StaticCheck {
                name: "disk",
                result: HealthCheckResult::unhealthy("full"),
            })
            .run()
            .await;
        assert_eq!(report.status, HealthStatus::Unhealthy);
        assert_eq!(report.entries.len(), 3);
    }

    #[tokio::test]
    async fn logs_each_check_and_the_report() {
        let (logs, _guard) = capture_logs();
        let checks = HealthChecks::new()
            .with_check(StaticCheck {
                name: "db",
                result: HealthCheckResult::healthy(),
            })
            .with_check(StaticCheck {
                name: "queue",
                result: HealthCheckResult::unhealthy("backlog"),
            });

        checks.run().await;

        let completed = logs.fields_of("health check completed");
        assert_eq!(completed.len(), 2);
        assert_eq!(completed[0]["check"], "db");
        assert_eq!(completed[0]["status"], "Healthy");
        assert_eq!(completed[1]["check"], "queue");
        assert_eq!(completed[1]["status"], "Unhealthy");
        assert!(completed.iter().all(|fields| fields["duration_ms"].is_u64()));

        let failed = logs.fields_of("health check failed");
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0]["description"], "backlog");

        let report = logs.fields_of("health report");
        assert_eq!(report.len(), 1);
        assert_eq!(report[0]["status"], "Unhealthy");
        assert_eq!(report[0]["checks"], 2);
    }

    #[test]
    fn maps_status_to_http() {
        assert_eq!(HealthStatus::Healthy.status_code(), StatusCode::OK);
        assert_eq!(HealthStatus::Degraded.status_code(), StatusCode::OK);
        assert_eq!(
            HealthStatus::Unhealthy.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(HealthStatus::Degraded.to_string(), "Degraded");
    }
}
