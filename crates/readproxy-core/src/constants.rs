//! Shared constants.

/// URI schemes that are never rewritten by the link-rewrite engine.
pub const UNSUPPORTED_SCHEMES: [&str; 4] = ["javascript:", "data:", "mailto:", "tel:"];

/// User agent presented to target sites by the headless browser.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// Accept-Language header presented to target sites.
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Upper bound on page navigation, in milliseconds.
pub const NAVIGATION_TIMEOUT_MS: u64 = 20_000;

/// Quiet window that counts as "network idle", in milliseconds.
pub const NETWORK_IDLE_QUIET_MS: u64 = 500;

/// Upper bound on the whole network-idle wait, in milliseconds.
pub const NETWORK_IDLE_TIMEOUT_MS: u64 = 1_000;

/// Fixed browser viewport.
pub const VIEWPORT_WIDTH: u32 = 1280;
pub const VIEWPORT_HEIGHT: u32 = 800;
