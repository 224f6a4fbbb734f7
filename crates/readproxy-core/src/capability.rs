//! Capability seams.
//!
//! The router is wired against these traits rather than concrete
//! collaborators, so the browser, readability and image backends can
//! be swapped for test doubles.

use async_trait::async_trait;

use crate::error::ProxyError;

/// A readability-extracted article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    /// Extracted HTML fragment (not a full document).
    pub content: String,
}

/// Image bytes ready to be returned, always JPEG.
#[derive(Debug, Clone)]
pub struct JpegImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Renders a target URL in a headless browser and returns the raw
/// serialized HTML of whatever loaded.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, target_url: &str) -> Result<String, ProxyError>;
}

/// Extracts the readable article from a rendered document.
pub trait ArticleExtractor: Send + Sync {
    fn extract(&self, html: &str, target_url: &str) -> Result<Article, ProxyError>;
}

/// Fetches a remote image and converts it to JPEG.
#[async_trait]
pub trait ImageConverter: Send + Sync {
    async fn fetch_jpeg(&self, url: &str) -> Result<JpegImage, ProxyError>;
}

/// Process-wide self-termination guard.
///
/// Armed at the end of a render, cancelled at the start of the next
/// invocation. A last-resort guard against runtime-level resource
/// leaks in a reused execution environment.
pub trait ProcessGuard: Send + Sync {
    fn arm(&self);
    fn cancel(&self);
}

/// Guard that does nothing; used for long-lived server processes and
/// in tests.
#[derive(Debug, Default)]
pub struct NoopGuard;

impl ProcessGuard for NoopGuard {
    fn arm(&self) {}
    fn cancel(&self) {}
}
