//! HTTP server for the Prometheus metrics endpoint.

use super::{MetricsConfig, MetricsRegistry};
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::CorsLayer;

/// Errors that can occur during metrics server operations.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid bind address {0:?}")]
    Address(String),

    #[error("failed to bind to address: {0}")]
    Bind(#[from] std::io::Error),

    #[error("server error: {0}")]
    Server(String),
}

/// HTTP server exposing `/metrics` and `/health`.
pub struct MetricsServer {
    bind_addr: SocketAddr,
    registry: Arc<MetricsRegistry>,
}

impl MetricsServer {
    /// Creates a server for the configured address.
    pub fn new(
        config: &MetricsConfig,
        registry: Arc<MetricsRegistry>,
    ) -> Result<Self, ServerError> {
        let ip: IpAddr = config
            .bind_addr
            .parse()
            .map_err(|_| ServerError::Address(config.bind_addr.clone()))?;
        Ok(Self {
            bind_addr: SocketAddr::new(ip, config.port),
            registry,
        })
    }

    /// Returns the address the server binds to.
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Runs the server until the task is dropped.
    pub async fn run(self) -> Result<(), ServerError> {
        let app = Router::new()
            .route("/metrics", get(metrics_handler))
            .route("/health", get(health_handler))
            .layer(CorsLayer::permissive())
            .with_state(self.registry);

        let listener = tokio::net::TcpListener::bind(self.bind_addr).await?;
        tracing::info!(addr = %self.bind_addr, "Metrics server listening");

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Server(e.to_string()))
    }
}

async fn metrics_handler(State(registry): State<Arc<MetricsRegistry>>) -> impl IntoResponse {
    match registry.encode() {
        Ok(output) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            output,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {}", e),
        ),
    }
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_addr_from_config() {
        let registry = Arc::new(MetricsRegistry::new().unwrap());
        let config = MetricsConfig {
            port: 9464,
            ..MetricsConfig::default()
        };

        let server = MetricsServer::new(&config, registry).unwrap();
        assert_eq!(server.bind_addr(), "127.0.0.1:9464".parse().unwrap());
    }

    #[test]
    fn test_invalid_bind_addr() {
        let registry = Arc::new(MetricsRegistry::new().unwrap());
        let config = MetricsConfig {
            bind_addr: String::from("localhost:x"),
            ..MetricsConfig::default()
        };

        assert!(matches!(
            MetricsServer::new(&config, registry),
            Err(ServerError::Address(_))
        ));
    }
}
