//! Statusflare service crate.
//!
//! A small Axum service answering a greeting route plus the health, readiness and metrics
//! endpoints container platforms probe. Every request is timed and logged as a JSON line.

pub mod config;
pub mod error;
pub mod health;
pub mod middleware;
pub mod process;
pub mod routes;
pub mod runtime;
pub mod state;
pub mod telemetry;

#[cfg(test)]
mod test_support;

pub use crate::config::{ConfigError, ServiceConfig, ServiceConfigBuilder};
pub use crate::error::{Result, StatusflareError};
pub use crate::health::{
    HealthCheck, HealthCheckResult, HealthChecks, HealthReport, HealthReportEntry, HealthStatus,
};
pub use crate::routes::{Greeting, Metrics, Readiness, router};
pub use crate::runtime::{StatusService, run, serve_listener};
pub use crate::state::ServiceState;
