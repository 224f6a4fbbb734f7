//! CDP page session for driving a single page.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::SinkExt;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace};

use crate::driver::{PageHandle, PageProfile};
use crate::error::BrowserError;

use super::client::{PendingRequest, WsSink};
use super::protocol::CdpRequest;

/// Injected before any page script runs, so sites see an ordinary
/// browser instead of an automated one.
const STEALTH_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
window.chrome = window.chrome || { runtime: {} };
const originalQuery = window.navigator.permissions.query.bind(window.navigator.permissions);
window.navigator.permissions.query = (parameters) =>
  parameters.name === 'notifications'
    ? Promise.resolve({ state: Notification.permission })
    : originalQuery(parameters);
"#;

/// A session attached to a single page target.
pub struct PageSession {
    /// Target ID.
    target_id: String,
    /// Session ID for this target.
    session_id: String,
    /// WebSocket sender (shared with client).
    ws_tx: Arc<tokio::sync::Mutex<WsSink>>,
    /// Pending requests (shared with client).
    pending: Arc<Mutex<HashMap<u64, PendingRequest>>>,
    /// Request ID counter (shared with client).
    request_id: Arc<AtomicU64>,
}

impl PageSession {
    pub(crate) fn new(
        target_id: String,
        session_id: String,
        ws_tx: Arc<tokio::sync::Mutex<WsSink>>,
        pending: Arc<Mutex<HashMap<u64, PendingRequest>>>,
        request_id: Arc<AtomicU64>,
    ) -> Self {
        Self {
            target_id,
            session_id,
            ws_tx,
            pending,
            request_id,
        }
    }

    /// Get target ID.
    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Send a CDP command to this page session.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, BrowserError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);

        let request = CdpRequest {
            id,
            method: method.to_string(),
            params,
            session_id: Some(self.session_id.clone()),
        };

        let json = serde_json::to_string(&request)?;
        trace!("CDP session send: {}", json);

        let (tx, rx) = tokio::sync::oneshot::channel();
        self.pending.lock().insert(id, PendingRequest { tx });

        {
            let mut ws = self.ws_tx.lock().await;
            ws.send(Message::Text(json.into())).await?;
        }

        match tokio::time::timeout(std::time::Duration::from_secs(30), rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(BrowserError::SessionClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(BrowserError::Timeout(format!("Request {} timed out", method)))
            }
        }
    }

    /// Enable required CDP domains.
    pub(crate) async fn enable_domains(&self) -> Result<(), BrowserError> {
        self.call("Page.enable", None).await?;
        self.call("Runtime.enable", None).await?;
        self.call("Network.enable", None).await?;
        debug!("Enabled CDP domains for session {}", self.session_id);
        Ok(())
    }

    /// Evaluate a JavaScript expression and return its value.
    pub async fn evaluate(&self, expression: &str) -> Result<Value, BrowserError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                })),
            )
            .await?;

        if let Some(exception) = result.get("exceptionDetails") {
            let text = exception["text"].as_str().unwrap_or("Unknown error");
            return Err(BrowserError::JavaScript(text.to_string()));
        }

        Ok(result["result"]["value"].clone())
    }

    /// Start navigation. Readiness is waited for separately.
    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        let result = self.call("Page.navigate", Some(json!({"url": url}))).await?;

        if let Some(error) = result.get("errorText") {
            return Err(BrowserError::NavigationFailed(
                error.as_str().unwrap_or("Unknown error").to_string(),
            ));
        }
        Ok(())
    }

    /// Poll until the document is interactive or complete. Callers
    /// bound this with their own timeout.
    async fn wait_for_ready(&self) -> Result<(), BrowserError> {
        loop {
            let result = self.evaluate("document.readyState").await?;

            if let Some(state) = result.as_str() {
                if state == "complete" || state == "interactive" {
                    return Ok(());
                }
            }

            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    async fn resource_count(&self) -> Result<u64, BrowserError> {
        let result = self
            .evaluate("performance.getEntriesByType('resource').length")
            .await?;
        Ok(result.as_u64().unwrap_or(0))
    }
}

#[async_trait]
impl PageHandle for PageSession {
    async fn configure(&self, profile: &PageProfile) -> Result<(), BrowserError> {
        self.call(
            "Emulation.setDeviceMetricsOverride",
            Some(json!({
                "width": profile.viewport_width,
                "height": profile.viewport_height,
                "deviceScaleFactor": 1,
                "mobile": false,
            })),
        )
        .await?;

        self.call(
            "Network.setUserAgentOverride",
            Some(json!({
                "userAgent": profile.user_agent,
                "acceptLanguage": profile.accept_language,
            })),
        )
        .await?;

        if profile.stealth {
            self.call(
                "Page.addScriptToEvaluateOnNewDocument",
                Some(json!({"source": STEALTH_SCRIPT})),
            )
            .await?;
        }

        Ok(())
    }

    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.navigate(url).await?;
        self.wait_for_ready().await?;
        debug!("Navigated to {}", url);
        Ok(())
    }

    async fn wait_for_network_idle(&self, quiet: Duration) -> Result<(), BrowserError> {
        let mut last_count = self.resource_count().await?;
        let mut last_change = tokio::time::Instant::now();

        loop {
            if last_change.elapsed() >= quiet {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(100)).await;

            let count = self.resource_count().await?;
            if count != last_count {
                last_count = count;
                last_change = tokio::time::Instant::now();
            }
        }
    }

    async fn content(&self) -> Result<String, BrowserError> {
        let result = self
            .evaluate(
                "(document.doctype ? '<!DOCTYPE ' + document.doctype.name + '>\\n' : '') \
                 + document.documentElement.outerHTML",
            )
            .await?;
        Ok(result.as_str().unwrap_or("").to_string())
    }
}
