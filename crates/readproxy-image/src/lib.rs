//! Image proxying: fetch a remote image and hand back JPEG bytes.
//!
//! JPEG upstreams pass through untouched; everything else is decoded,
//! flattened onto white (e-ink targets render transparency as black)
//! and re-encoded.

mod convert;

pub use convert::{ImageError, JpegFetcher};
