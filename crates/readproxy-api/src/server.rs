//! HTTP server wrapping the proxy handler.

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;

use crate::handler::ProxyHandler;
use crate::http::router;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid listen address: {0}")]
    Addr(#[from] std::net::AddrParseError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Proxy server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// The proxy's HTTP front door.
pub struct ProxyServer {
    config: ServerConfig,
    handler: Arc<ProxyHandler>,
}

impl ProxyServer {
    pub fn new(config: ServerConfig, handler: Arc<ProxyHandler>) -> Self {
        Self { config, handler }
    }

    /// Get the server address.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Start the server.
    pub async fn run(&self) -> Result<(), ServerError> {
        let app = router(self.handler.clone());

        let addr: SocketAddr = self.addr().parse()?;
        let listener = TcpListener::bind(addr).await?;

        info!("Proxy server listening on {}", addr);
        axum::serve(listener, app).await?;

        Ok(())
    }
}
