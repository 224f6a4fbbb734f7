//! Headless browser rendering.
//!
//! Launches a throwaway Chromium per render, drives it over the
//! DevTools protocol, and guarantees teardown even when the process
//! wedges. The orchestration lives in [`BrowserSession`]; the
//! Chromium specifics hide behind the [`driver`] traits.

pub mod cdp;
mod chromium;
mod driver;
mod error;
mod guard;
mod session;

pub use chromium::{find_chromium, ChromiumConfig, ChromiumDriver};
pub use driver::{BrowserDriver, BrowserHandle, PageHandle, PageProfile};
pub use error::BrowserError;
pub use guard::SelfTerminationGuard;
pub use session::{BrowserSession, SessionConfig};
