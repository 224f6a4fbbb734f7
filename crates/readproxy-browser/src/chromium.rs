//! Headless Chromium driver.
//!
//! Each render launches a fresh process with a throwaway profile and
//! tears it down afterwards, so a wedged page never poisons the next
//! request.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::cdp::CdpClient;
use crate::driver::{BrowserDriver, BrowserHandle, PageHandle};
use crate::error::BrowserError;

/// Chromium launch configuration.
#[derive(Debug, Clone)]
pub struct ChromiumConfig {
    /// Remote debugging port. Zero lets Chromium pick a free port,
    /// published through the profile's `DevToolsActivePort` file, so
    /// concurrent launches never attach to each other's instance.
    pub debug_port: u16,
    /// Explicit executable path; probed when unset.
    pub executable: Option<PathBuf>,
    /// Whether to run headless.
    pub headless: bool,
}

impl Default for ChromiumConfig {
    fn default() -> Self {
        Self {
            debug_port: 0,
            executable: None,
            headless: true,
        }
    }
}

/// Find a Chromium executable path.
pub fn find_chromium() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        let paths = [
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
        ];
        for path in &paths {
            let p = PathBuf::from(path);
            if p.exists() {
                return Some(p);
            }
        }
    }

    #[cfg(target_os = "linux")]
    {
        let paths = [
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
        ];
        for path in &paths {
            let p = PathBuf::from(path);
            if p.exists() {
                return Some(p);
            }
        }
    }

    #[cfg(target_os = "windows")]
    {
        let paths = [
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ];
        for path in &paths {
            let p = PathBuf::from(path);
            if p.exists() {
                return Some(p);
            }
        }
    }

    None
}

/// First line of `DevToolsActivePort` is the bound port; the second
/// is the browser target path.
fn parse_devtools_port(contents: &str) -> Option<u16> {
    contents.lines().next()?.trim().parse().ok()
}

/// Poll the profile directory until Chromium publishes the debugging
/// port it bound.
async fn wait_for_devtools_port(profile: &Path) -> Result<u16, BrowserError> {
    let marker = profile.join("DevToolsActivePort");
    for _ in 0..30 {
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        if let Ok(contents) = tokio::fs::read_to_string(&marker).await {
            if let Some(port) = parse_devtools_port(&contents) {
                return Ok(port);
            }
        }
    }
    Err(BrowserError::LaunchFailed(
        "Chromium did not publish DevToolsActivePort within timeout".to_string(),
    ))
}

/// Launches Chromium processes with remote debugging enabled.
pub struct ChromiumDriver {
    config: ChromiumConfig,
}

impl ChromiumDriver {
    pub fn new(config: ChromiumConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn launch(&self) -> Result<Box<dyn BrowserHandle>, BrowserError> {
        let executable = match &self.config.executable {
            Some(path) => path.clone(),
            None => find_chromium().ok_or(BrowserError::ChromiumNotFound)?,
        };

        let profile_dir = TempDir::new()
            .map_err(|e| BrowserError::LaunchFailed(format!("profile dir: {}", e)))?;

        info!(
            "Launching Chromium with profile at: {}",
            profile_dir.path().display()
        );

        let mut cmd = Command::new(&executable);
        cmd.arg(format!("--remote-debugging-port={}", self.config.debug_port))
            .arg(format!("--user-data-dir={}", profile_dir.path().display()))
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--disable-gpu")
            .arg("--hide-scrollbars")
            .arg("--mute-audio")
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        if self.config.headless {
            cmd.arg("--headless=new");
        }

        let child = cmd
            .spawn()
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        info!("Chromium launched with PID: {:?}", child.id());

        let port = if self.config.debug_port == 0 {
            wait_for_devtools_port(profile_dir.path()).await?
        } else {
            self.config.debug_port
        };

        // Wait for the debugging endpoint to come up.
        let endpoint = format!("http://localhost:{}", port);
        let version_url = format!("{}/json/version", endpoint);
        let mut attempts = 0;
        let max_attempts = 30; // 30 * 200ms = 6 seconds
        loop {
            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            if reqwest::get(&version_url).await.is_ok() {
                break;
            }
            attempts += 1;
            if attempts >= max_attempts {
                return Err(BrowserError::LaunchFailed(
                    "Chromium failed to start within timeout".to_string(),
                ));
            }
        }

        let client = CdpClient::connect(&endpoint).await?;

        Ok(Box::new(ChromiumHandle {
            child,
            client: Arc::new(client),
            _profile_dir: profile_dir,
        }))
    }
}

/// A running Chromium process plus its CDP connection.
pub struct ChromiumHandle {
    child: Child,
    client: Arc<CdpClient>,
    /// Deleted on drop, after the process has exited.
    _profile_dir: TempDir,
}

#[async_trait]
impl BrowserHandle for ChromiumHandle {
    async fn new_page(&self) -> Result<Box<dyn PageHandle>, BrowserError> {
        let session = self.client.new_page().await?;
        Ok(Box::new(session))
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        self.client.close_browser().await?;
        self.child
            .wait()
            .await
            .map_err(|e| BrowserError::LaunchFailed(format!("wait: {}", e)))?;
        debug!("Chromium exited cleanly");
        Ok(())
    }

    async fn force_kill(&mut self) {
        if let Err(e) = self.child.kill().await {
            warn!("Failed to kill Chromium: {}", e);
        }
    }

    fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_picks_an_ephemeral_port() {
        let config = ChromiumConfig::default();
        assert_eq!(config.debug_port, 0);
        assert!(config.headless);
        assert!(config.executable.is_none());
    }

    #[test]
    fn parses_devtools_active_port() {
        assert_eq!(parse_devtools_port("39463\n/devtools/browser/abc"), Some(39463));
        assert_eq!(parse_devtools_port(""), None);
        assert_eq!(parse_devtools_port("not a port\n"), None);
    }

    #[tokio::test]
    async fn discovers_port_from_profile_dir() {
        let profile = tempfile::tempdir().unwrap();
        std::fs::write(
            profile.path().join("DevToolsActivePort"),
            "41234\n/devtools/browser/xyz",
        )
        .unwrap();

        let port = wait_for_devtools_port(profile.path()).await.unwrap();
        assert_eq!(port, 41234);
    }

    #[test]
    fn find_chromium_does_not_panic() {
        // May or may not find a browser depending on the system.
        let _result = find_chromium();
    }
}
