//! Driver traits behind which the concrete browser hides.
//!
//! `BrowserSession` drives rendering exclusively through these traits
//! so the launch/navigate/teardown choreography can be tested against
//! scripted fakes.

use std::time::Duration;

use async_trait::async_trait;

use readproxy_core::constants::{
    DEFAULT_ACCEPT_LANGUAGE, DEFAULT_USER_AGENT, VIEWPORT_HEIGHT, VIEWPORT_WIDTH,
};

use crate::error::BrowserError;

/// Per-page environment applied before navigation.
#[derive(Debug, Clone)]
pub struct PageProfile {
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub user_agent: String,
    pub accept_language: String,
    /// Mask the automation tells sites probe for.
    pub stealth: bool,
}

impl Default for PageProfile {
    fn default() -> Self {
        Self {
            viewport_width: VIEWPORT_WIDTH,
            viewport_height: VIEWPORT_HEIGHT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            stealth: true,
        }
    }
}

/// One open page inside a running browser.
#[async_trait]
pub trait PageHandle: Send + Sync {
    /// Apply viewport, user agent and stealth overrides.
    async fn configure(&self, profile: &PageProfile) -> Result<(), BrowserError>;

    /// Navigate and wait until the document is ready. No internal
    /// deadline; callers race this against their own timeout.
    async fn goto(&self, url: &str) -> Result<(), BrowserError>;

    /// Resolve once no new resources have loaded for `quiet`.
    async fn wait_for_network_idle(&self, quiet: Duration) -> Result<(), BrowserError>;

    /// Serialize the current document, doctype included.
    async fn content(&self) -> Result<String, BrowserError>;
}

/// A running browser process.
#[async_trait]
pub trait BrowserHandle: Send + Sync {
    async fn new_page(&self) -> Result<Box<dyn PageHandle>, BrowserError>;

    /// Ask the browser to shut down and reap the process.
    async fn close(&mut self) -> Result<(), BrowserError>;

    /// Kill the process without ceremony.
    async fn force_kill(&mut self);

    fn pid(&self) -> Option<u32>;

    fn is_alive(&mut self) -> bool;
}

/// Launches browser processes.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserHandle>, BrowserError>;
}
