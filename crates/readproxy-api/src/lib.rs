//! Request routing and the HTTP front door.
//!
//! [`ProxyHandler`] owns the full request lifecycle: favicon
//! short-circuit, target resolution, branch selection (image, welcome,
//! readable, full-page) and error mapping. [`ProxyServer`] exposes it
//! over HTTP via axum.

mod handler;
mod http;
mod server;

pub use handler::ProxyHandler;
pub use http::router;
pub use server::{ProxyServer, ServerConfig, ServerError};
