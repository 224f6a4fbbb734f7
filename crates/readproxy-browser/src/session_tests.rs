use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::driver::{BrowserDriver, BrowserHandle, PageHandle, PageProfile};
use crate::error::BrowserError;

use super::{BrowserSession, SessionConfig};

#[derive(Clone, Default)]
struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    fn push(&self, entry: &str) {
        self.0.lock().push(entry.to_string());
    }

    fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    fn count(&self, entry: &str) -> usize {
        self.0.lock().iter().filter(|e| *e == entry).count()
    }
}

#[derive(Clone, Copy, Default)]
struct FakeBehavior {
    launch_fails: bool,
    goto_hangs: bool,
    goto_nav_error: bool,
    goto_timeout_error: bool,
    idle_fails: bool,
    idle_timeout_error: bool,
    close_fails: bool,
    close_hangs: bool,
    alive_after_close: bool,
    alive_after_kill: bool,
    pid: Option<u32>,
}

const HTML: &str = "<html><body>rendered</body></html>";

struct FakePage {
    behavior: FakeBehavior,
    log: Log,
}

#[async_trait]
impl PageHandle for FakePage {
    async fn configure(&self, _profile: &PageProfile) -> Result<(), BrowserError> {
        self.log.push("configure");
        Ok(())
    }

    async fn goto(&self, _url: &str) -> Result<(), BrowserError> {
        self.log.push("goto");
        if self.behavior.goto_hangs {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.behavior.goto_nav_error {
            return Err(BrowserError::NavigationFailed("net::ERR_FAILED".into()));
        }
        if self.behavior.goto_timeout_error {
            return Err(BrowserError::Timeout(
                "Navigation timeout of 20000 ms exceeded".into(),
            ));
        }
        Ok(())
    }

    async fn wait_for_network_idle(&self, _quiet: Duration) -> Result<(), BrowserError> {
        self.log.push("idle");
        if self.behavior.idle_fails {
            return Err(BrowserError::SessionClosed);
        }
        if self.behavior.idle_timeout_error {
            return Err(BrowserError::Timeout("network idle wait timed out".into()));
        }
        Ok(())
    }

    async fn content(&self) -> Result<String, BrowserError> {
        self.log.push("content");
        Ok(HTML.to_string())
    }
}

struct FakeBrowser {
    behavior: FakeBehavior,
    log: Log,
    force_killed: bool,
}

#[async_trait]
impl BrowserHandle for FakeBrowser {
    async fn new_page(&self) -> Result<Box<dyn PageHandle>, BrowserError> {
        self.log.push("new_page");
        Ok(Box::new(FakePage {
            behavior: self.behavior,
            log: self.log.clone(),
        }))
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        self.log.push("close");
        if self.behavior.close_hangs {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.behavior.close_fails {
            return Err(BrowserError::WebSocket("connection reset".into()));
        }
        Ok(())
    }

    async fn force_kill(&mut self) {
        self.log.push("force_kill");
        self.force_killed = true;
    }

    fn pid(&self) -> Option<u32> {
        self.behavior.pid
    }

    fn is_alive(&mut self) -> bool {
        if self.force_killed {
            self.behavior.alive_after_kill
        } else {
            self.behavior.alive_after_close
        }
    }
}

struct FakeDriver {
    behavior: FakeBehavior,
    log: Log,
}

#[async_trait]
impl BrowserDriver for FakeDriver {
    async fn launch(&self) -> Result<Box<dyn BrowserHandle>, BrowserError> {
        self.log.push("launch");
        if self.behavior.launch_fails {
            return Err(BrowserError::LaunchFailed("spawn failed".into()));
        }
        Ok(Box::new(FakeBrowser {
            behavior: self.behavior,
            log: self.log.clone(),
            force_killed: false,
        }))
    }
}

fn session_with(behavior: FakeBehavior) -> (BrowserSession, Log, Arc<Mutex<Vec<u32>>>) {
    let log = Log::default();
    let driver = Arc::new(FakeDriver {
        behavior,
        log: log.clone(),
    });
    let killed_pids: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
    let recorder = killed_pids.clone();
    let session = BrowserSession::new(driver, SessionConfig::default())
        .with_pid_killer(Arc::new(move |pid| recorder.lock().push(pid)));
    (session, log, killed_pids)
}

async fn drain_escalation() {
    // Past both kill_grace pauses of the detached teardown task.
    tokio::time::sleep(Duration::from_secs(10)).await;
}

#[tokio::test(start_paused = true)]
async fn renders_content_and_closes() {
    let (session, log, _) = session_with(FakeBehavior::default());

    let html = session.render_page("https://example.com").await.unwrap();
    assert_eq!(html, HTML);

    drain_escalation().await;
    assert_eq!(
        log.entries(),
        ["launch", "new_page", "configure", "goto", "idle", "content", "close"]
    );
}

#[tokio::test(start_paused = true)]
async fn launch_failure_is_fatal() {
    let (session, log, _) = session_with(FakeBehavior {
        launch_fails: true,
        ..Default::default()
    });

    let err = session.render_page("https://example.com").await.unwrap_err();
    assert!(matches!(err, BrowserError::LaunchFailed(_)));
    assert_eq!(log.entries(), ["launch"]);
}

#[tokio::test(start_paused = true)]
async fn hung_navigation_degrades_to_partial_content() {
    let (session, log, _) = session_with(FakeBehavior {
        goto_hangs: true,
        ..Default::default()
    });

    let html = session.render_page("https://example.com").await.unwrap();
    assert_eq!(html, HTML);
    assert_eq!(log.count("content"), 1);
}

#[tokio::test(start_paused = true)]
async fn navigation_timeout_error_degrades_to_partial_content() {
    let (session, _, _) = session_with(FakeBehavior {
        goto_timeout_error: true,
        ..Default::default()
    });

    let html = session.render_page("https://example.com").await.unwrap();
    assert_eq!(html, HTML);
}

#[tokio::test(start_paused = true)]
async fn navigation_failure_propagates_but_still_tears_down() {
    let (session, log, _) = session_with(FakeBehavior {
        goto_nav_error: true,
        ..Default::default()
    });

    let err = session.render_page("https://example.com").await.unwrap_err();
    assert!(matches!(err, BrowserError::NavigationFailed(_)));
    assert_eq!(log.count("close"), 1);
}

#[tokio::test(start_paused = true)]
async fn idle_wait_timeout_degrades_to_partial_content() {
    let (session, _, _) = session_with(FakeBehavior {
        idle_timeout_error: true,
        ..Default::default()
    });

    let html = session.render_page("https://example.com").await.unwrap();
    assert_eq!(html, HTML);
}

#[tokio::test(start_paused = true)]
async fn non_timeout_idle_error_is_fatal() {
    let (session, log, _) = session_with(FakeBehavior {
        idle_fails: true,
        ..Default::default()
    });

    let err = session.render_page("https://example.com").await.unwrap_err();
    assert!(matches!(err, BrowserError::SessionClosed));
    assert_eq!(log.count("close"), 1);
}

#[tokio::test(start_paused = true)]
async fn surviving_browser_is_force_killed_exactly_once() {
    let (session, log, killed_pids) = session_with(FakeBehavior {
        alive_after_close: true,
        pid: Some(4242),
        ..Default::default()
    });

    session.render_page("https://example.com").await.unwrap();
    drain_escalation().await;

    assert_eq!(log.count("force_kill"), 1);
    assert!(killed_pids.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn unkillable_browser_gets_pid_sigkill() {
    let (session, log, killed_pids) = session_with(FakeBehavior {
        alive_after_close: true,
        alive_after_kill: true,
        pid: Some(4242),
        ..Default::default()
    });

    session.render_page("https://example.com").await.unwrap();
    drain_escalation().await;

    assert_eq!(log.count("force_kill"), 1);
    assert_eq!(*killed_pids.lock(), vec![4242]);
}

#[tokio::test(start_paused = true)]
async fn hung_close_escalates_to_kill() {
    let (session, log, _) = session_with(FakeBehavior {
        close_hangs: true,
        alive_after_close: true,
        ..Default::default()
    });

    let html = session.render_page("https://example.com").await.unwrap();
    assert_eq!(html, HTML);

    drain_escalation().await;
    assert_eq!(log.count("force_kill"), 1);
}

#[tokio::test(start_paused = true)]
async fn rejected_close_is_force_killed_exactly_once() {
    let (session, log, killed_pids) = session_with(FakeBehavior {
        close_fails: true,
        pid: Some(99),
        ..Default::default()
    });

    session.render_page("https://example.com").await.unwrap();
    drain_escalation().await;

    assert_eq!(log.count("force_kill"), 1);
    assert!(killed_pids.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn clean_close_skips_escalation() {
    let (session, log, killed_pids) = session_with(FakeBehavior {
        pid: Some(99),
        ..Default::default()
    });

    session.render_page("https://example.com").await.unwrap();
    drain_escalation().await;

    assert_eq!(log.count("force_kill"), 0);
    assert!(killed_pids.lock().is_empty());
}
