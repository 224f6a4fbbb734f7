//! Core domain for the readproxy rendering proxy.
//!
//! Everything in this crate is pure: request/response types, the
//! target-URL resolver, the proxy-base composer and the capability
//! traits the routing layer is wired against. No I/O happens here.

pub mod capability;
pub mod constants;
pub mod error;
pub mod proxy_base;
pub mod resolve;
pub mod types;

pub use capability::{Article, ArticleExtractor, ImageConverter, JpegImage, NoopGuard, PageRenderer, ProcessGuard};
pub use error::ProxyError;
pub use proxy_base::build_proxy_base;
pub use resolve::resolve_target;
pub use types::{NormalizedTarget, RawRequest, RenderOutcome};
