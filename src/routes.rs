//! Route handlers for the status service.
//!
//! - `/` - greeting, counts the request
//! - `/health` - liveness, backed by [`HealthChecks`]
//! - `/ready` - readiness, always ready once serving
//! - `/metrics` - uptime, memory and request counters

use axum::Json;
use axum::Router;
use axum::extract::{FromRef, State};
use axum::routing::get;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::health::{HealthChecks, HealthReport};
use crate::middleware::log_requests;
use crate::process;
use crate::state::ServiceState;

const GREETING: &str = "Hello from Azure - Auto Deployed! 🚀";
const READY: &str = "ready";

/// State handed to every handler.
#[derive(Clone, Debug)]
pub(crate) struct AppState {
    service: ServiceState,
    health: HealthChecks,
}

impl FromRef<AppState> for ServiceState {
    fn from_ref(state: &AppState) -> Self {
        state.service.clone()
    }
}

impl FromRef<AppState> for HealthChecks {
    fn from_ref(state: &AppState) -> Self {
        state.health.clone()
    }
}

/// Builds the service router with request logging applied to every route.
pub fn router(service: ServiceState, health: HealthChecks) -> Router {
    Router::new()
        .route("/", get(greeting))
        .route("/health", get(health_check))
        .route("/ready", get(ready))
        .route("/metrics", get(metrics))
        .layer(axum::middleware::from_fn(log_requests))
        .with_state(AppState { service, health })
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Greeting {
    pub message: String,
    pub version: String,
    pub uptime: String,
    pub request_count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Readiness {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub uptime_seconds: u64,
    #[serde(rename = "memoryMB")]
    pub memory_mb: u64,
    pub version: String,
    pub request_count: u64,
    pub timestamp: DateTime<Utc>,
}

async fn greeting(State(service): State<ServiceState>) -> Json<Greeting> {
    let count = service.record_request();
    tracing::info!(count, "greeting request received");

    Json(Greeting {
        message: GREETING.to_owned(),
        version: service.version().to_owned(),
        uptime: format!("{:.0}s", service.uptime().as_secs_f64()),
        request_count: count,
    })
}

async fn health_check(State(health): State<HealthChecks>) -> HealthReport {
    health.run().await
}

async fn ready() -> Json<Readiness> {
    Json(Readiness {
        status: READY.to_owned(),
        timestamp: Utc::now(),
    })
}

async fn metrics(State(service): State<ServiceState>) -> Json<Metrics> {
    Json(Metrics {
        uptime_seconds: service.uptime().as_secs(),
        memory_mb: process::memory_mb(),
        version: service.version().to_owned(),
        request_count: service.request_count(),
        timestamp: Utc::now(),
    })
}
