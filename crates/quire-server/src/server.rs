use tokio::net::TcpListener;

use crate::config::QuireConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// quire HTTP server.
pub struct QuireServer {
    config: QuireConfig,
    state: AppState,
}

impl QuireServer {
    /// Open the configured store. Fails if the store URL is unusable.
    pub fn new(config: QuireConfig) -> ServerResult<Self> {
        config.validate()?;
        let state = AppState::from_config(&config)?;
        Ok(Self { config, state })
    }

    pub fn with_state(config: QuireConfig, state: AppState) -> Self {
        Self { config, state }
    }

    pub fn config(&self) -> &QuireConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Serve until ctrl-c. In-flight appends run to completion on their own
    /// tasks.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            addr = %self.config.bind_addr,
            store = %self.config.store_url,
            "quire server listening"
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_construction() {
        let server = QuireServer::new(QuireConfig::default()).unwrap();
        assert_eq!(server.config().bind_addr, "127.0.0.1:8787".parse().unwrap());
        let _router = server.router();
    }

    #[test]
    fn invalid_store_url_fails() {
        let config = QuireConfig {
            store_url: "not a url".into(),
            ..QuireConfig::default()
        };
        assert!(QuireServer::new(config).is_err());
    }
}
