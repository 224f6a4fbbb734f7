//! Render orchestration: launch, navigate, serialize, tear down.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use readproxy_core::constants::{
    NAVIGATION_TIMEOUT_MS, NETWORK_IDLE_QUIET_MS, NETWORK_IDLE_TIMEOUT_MS,
};
use readproxy_core::{PageRenderer, ProxyError};

use crate::driver::{BrowserDriver, BrowserHandle, PageProfile};
use crate::error::BrowserError;

/// Kills a process by PID. Injectable so teardown escalation can be
/// tested without signalling real processes.
pub type PidKiller = Arc<dyn Fn(u32) + Send + Sync>;

fn sigkill(pid: u32) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        warn!(pid, "SIGKILL failed: {}", e);
    }
}

/// Timing knobs for one render.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Hard ceiling on navigation; elapsing it degrades to whatever
    /// has loaded instead of failing.
    pub navigation_timeout: Duration,
    /// How long the network must stay quiet to count as idle.
    pub network_idle_quiet: Duration,
    /// Ceiling on the idle wait.
    pub network_idle_timeout: Duration,
    /// Bound on the graceful browser shutdown.
    pub close_timeout: Duration,
    /// Pause between teardown escalation steps.
    pub kill_grace: Duration,
    pub page_profile: PageProfile,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_millis(NAVIGATION_TIMEOUT_MS),
            network_idle_quiet: Duration::from_millis(NETWORK_IDLE_QUIET_MS),
            network_idle_timeout: Duration::from_millis(NETWORK_IDLE_TIMEOUT_MS),
            close_timeout: Duration::from_secs(3),
            kill_grace: Duration::from_secs(1),
            page_profile: PageProfile::default(),
        }
    }
}

/// Drives a browser through one page load per call and guarantees the
/// process is gone afterwards, escalating from graceful close to
/// SIGKILL if it lingers.
pub struct BrowserSession {
    driver: Arc<dyn BrowserDriver>,
    config: SessionConfig,
    pid_killer: PidKiller,
}

impl BrowserSession {
    pub fn new(driver: Arc<dyn BrowserDriver>, config: SessionConfig) -> Self {
        Self {
            driver,
            config,
            pid_killer: Arc::new(sigkill),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_pid_killer(mut self, pid_killer: PidKiller) -> Self {
        self.pid_killer = pid_killer;
        self
    }

    /// Render `url` and return the serialized document.
    ///
    /// Launch failures are fatal; navigation and idle-wait timeouts
    /// degrade to partial content.
    pub async fn render_page(&self, url: &str) -> Result<String, BrowserError> {
        let mut browser = self.driver.launch().await?;
        let result = self.drive(&*browser, url).await;
        let closed_cleanly = self.teardown(&mut browser).await;
        self.escalate_kill(browser, closed_cleanly);
        result
    }

    async fn drive(&self, browser: &dyn BrowserHandle, url: &str) -> Result<String, BrowserError> {
        let page = browser.new_page().await?;
        page.configure(&self.config.page_profile).await?;

        match tokio::time::timeout(self.config.navigation_timeout, page.goto(url)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) if e.is_timeout() => {
                warn!(url, "navigation timed out, continuing with partial content");
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                warn!(url, "navigation timed out, continuing with partial content");
            }
        }

        match tokio::time::timeout(
            self.config.network_idle_timeout,
            page.wait_for_network_idle(self.config.network_idle_quiet),
        )
        .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) if e.is_timeout() => {
                warn!(url, "network idle wait timed out, continuing with partial content");
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                warn!(url, "network did not go idle before deadline, continuing");
            }
        }

        page.content().await
    }

    /// Returns whether the browser shut down cleanly.
    async fn teardown(&self, browser: &mut Box<dyn BrowserHandle>) -> bool {
        match tokio::time::timeout(self.config.close_timeout, browser.close()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!("browser close failed: {}", e);
                false
            }
            Err(_) => {
                warn!("browser close timed out");
                false
            }
        }
    }

    /// Detached escalation: the response is not held hostage to a
    /// browser that refuses to die. A failed or timed-out close is
    /// force-killed regardless of what the liveness probe claims.
    fn escalate_kill(&self, mut browser: Box<dyn BrowserHandle>, closed_cleanly: bool) {
        let grace = self.config.kill_grace;
        let pid = browser.pid();
        let killer = self.pid_killer.clone();

        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            if !closed_cleanly || browser.is_alive() {
                warn!(?pid, "browser did not close cleanly, killing");
                browser.force_kill().await;

                tokio::time::sleep(grace).await;
                if let Some(pid) = pid {
                    if browser.is_alive() {
                        warn!(pid, "browser survived kill, sending SIGKILL");
                        killer(pid);
                    }
                }
            }
        });
    }
}

#[async_trait]
impl PageRenderer for BrowserSession {
    async fn render(&self, target_url: &str) -> Result<String, ProxyError> {
        self.render_page(target_url)
            .await
            .map_err(|e| ProxyError::Render(e.to_string()))
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
