use axum::Router;
use tokio::net::TcpListener;

use crate::config::ServiceConfig;
use crate::error::Result;
use crate::health::HealthChecks;
use crate::routes;
use crate::state::ServiceState;

/// High-level service that owns the configuration, state and health checks.
pub struct StatusService {
    config: ServiceConfig,
    state: ServiceState,
    health: HealthChecks,
}

impl StatusService {
    /// Creates a service with the provided configuration; the uptime clock starts here.
    pub fn new(config: ServiceConfig) -> Self {
        let state = ServiceState::from_config(&config);
        Self {
            config,
            state,
            health: HealthChecks::new(),
        }
    }

    /// Replaces the health checks consulted by `/health`.
    pub fn with_health_checks(mut self, health: HealthChecks) -> Self {
        self.health = health;
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Returns a handle to the shared state backing the routes.
    pub fn state(&self) -> ServiceState {
        self.state.clone()
    }

    /// Builds the router without binding a listener.
    pub fn router(&self) -> Router {
        routes::router(self.state.clone(), self.health.clone())
    }

    /// Consumes the service, binds the configured address and serves until shutdown.
    pub async fn serve(self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let addr = listener.local_addr()?;
        tracing::info!(
            urls = %self.config.urls,
            %addr,
            version = %self.config.version,
            "server started"
        );

        serve_listener(listener, self.router()).await
    }
}

/// Serves the router on an already bound listener until SIGTERM or Ctrl-C.
pub async fn serve_listener(listener: TcpListener, router: Router) -> Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// Loads [`ServiceConfig`] from the environment and starts serving.
pub async fn run() -> Result<()> {
    let config = ServiceConfig::from_env()?;
    StatusService::new(config).serve().await
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
