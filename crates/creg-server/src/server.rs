use std::sync::Arc;

use creg_engine::Registry;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::AppState;
use crate::router::build_router;

/// Certificate registry HTTP server.
pub struct RegistryServer {
    config: ServerConfig,
    registry: Arc<Registry>,
}

impl RegistryServer {
    /// Build the registry described by `config.registry`.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let registry = Registry::from_config(&config.registry)?;
        Ok(Self::with_registry(config, Arc::new(registry)))
    }

    /// Serve an already constructed registry.
    pub fn with_registry(config: ServerConfig, registry: Arc<Registry>) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        let state = AppState {
            registry: self.registry.clone(),
            max_payload_bytes: self.config.max_payload_bytes,
        };
        build_router(state, self.config.body_limit())
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "certificate registry listening");
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
