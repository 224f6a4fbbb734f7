//! Link-rewrite engine.
//!
//! Walks an HTML document (or fragment) in one streaming pass and
//! rewrites every navigable and asset reference so that browsing
//! stays inside the proxy: navigational links are re-proxied, image
//! assets are optionally routed through the JPEG-conversion route,
//! and everything else is absolutized against the original page URL.
//!
//! Rewriting is a pure function of (document, bases, origin URL).

mod encode;
mod engine;
mod srcset;

pub use encode::encode_uri;
pub use engine::{rewrite_document, RewriteError};
pub use srcset::rewrite_srcset;
