use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::config::ServiceConfig;

/// Process-wide service state shared by every request handler.
///
/// Clone is cheap; all clones observe the same counter.
#[derive(Clone, Debug)]
pub struct ServiceState {
    inner: Arc<ServiceStateInner>,
}

#[derive(Debug)]
struct ServiceStateInner {
    started: Instant,
    request_count: AtomicU64,
    version: String,
}

impl ServiceState {
    /// Creates the state, starting the uptime clock now.
    pub fn new(version: impl Into<String>) -> Self {
        Self::started_at(version, Instant::now())
    }

    /// Creates the state for the version carried by `config`.
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(config.version.clone())
    }

    pub(crate) fn started_at(version: impl Into<String>, started: Instant) -> Self {
        Self {
            inner: Arc::new(ServiceStateInner {
                started,
                request_count: AtomicU64::new(0),
                version: version.into(),
            }),
        }
    }

    pub fn version(&self) -> &str {
        &self.inner.version
    }

    /// Elapsed time since the state was created.
    pub fn uptime(&self) -> Duration {
        self.inner.started.elapsed()
    }

    /// Counts one greeting request and returns the count including it.
    pub fn record_request(&self) -> u64 {
        self.inner.request_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn request_count(&self) -> u64 {
        self.inner.request_count.load(Ordering::Relaxed)
    }
}
