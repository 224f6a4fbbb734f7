//! Self-termination guard for crash-prone hosting environments.
//!
//! When a render leaves the process in a bad state (leaked renderer,
//! wedged event loop), the safest recovery is a fresh process. The
//! guard arms a delayed SIGKILL against our own PID after each
//! response and cancels it when the next request arrives, so an idle
//! process eventually recycles itself while a busy one never dies
//! mid-request.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::warn;

use readproxy_core::ProcessGuard;

type Terminator = Arc<dyn Fn() + Send + Sync>;

fn kill_self() {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let _ = kill(Pid::this(), Signal::SIGKILL);
}

pub struct SelfTerminationGuard {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
    terminate: Terminator,
}

impl SelfTerminationGuard {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
            terminate: Arc::new(kill_self),
        }
    }

    #[cfg(test)]
    fn with_terminator(mut self, terminate: Terminator) -> Self {
        self.terminate = terminate;
        self
    }
}

impl ProcessGuard for SelfTerminationGuard {
    /// Arm the timer, replacing any pending one.
    fn arm(&self) {
        let delay = self.delay;
        let terminate = self.terminate.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            warn!("no request within {:?}, terminating process", delay);
            terminate();
        });
        if let Some(previous) = self.pending.lock().replace(handle) {
            previous.abort();
        }
    }

    fn cancel(&self) {
        if let Some(pending) = self.pending.lock().take() {
            pending.abort();
        }
    }
}
