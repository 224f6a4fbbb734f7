//! Browser and CDP error types.

use thiserror::Error;

/// Errors from browser lifecycle management and CDP traffic.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// No Chromium executable on this machine.
    #[error("Chromium not found. Install Google Chrome or Chromium.")]
    ChromiumNotFound,

    /// Process spawn or startup failure.
    #[error("Failed to launch Chromium: {0}")]
    LaunchFailed(String),

    /// Failed to connect to the debugging endpoint.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// CDP protocol error.
    #[error("CDP error: {message} (code: {code})")]
    Protocol { code: i64, message: String },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error (for endpoint discovery).
    #[error("HTTP error: {0}")]
    Http(String),

    /// Navigation failed outright.
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// JavaScript evaluation raised.
    #[error("JavaScript error: {0}")]
    JavaScript(String),

    /// A wait exceeded its deadline.
    #[error("{0}")]
    Timeout(String),

    /// Session closed underneath a pending request.
    #[error("Session closed")]
    SessionClosed,

    /// Invalid response.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl BrowserError {
    /// Timeouts degrade to partial content instead of failing the render.
    pub fn is_timeout(&self) -> bool {
        matches!(self, BrowserError::Timeout(_))
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for BrowserError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        BrowserError::WebSocket(e.to_string())
    }
}

impl From<reqwest::Error> for BrowserError {
    fn from(e: reqwest::Error) -> Self {
        BrowserError::Http(e.to_string())
    }
}
