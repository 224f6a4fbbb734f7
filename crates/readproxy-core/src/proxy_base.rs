//! Proxy-base composition.
//!
//! The proxy base is the absolute URL prefix all regenerated links
//! must be rooted at. It combines the forwarded-proto/host headers
//! with any gateway prefix (forwarded header) and the path-derived
//! prefix, in that order.

use crate::types::RawRequest;

fn normalize_prefix(value: &str) -> &str {
    value.trim_matches('/')
}

/// Compose the proxy base for a request and path prefix.
///
/// Returns the empty string when no host header is present, which is
/// how a direct (non-proxied) invocation such as a local CLI run is
/// detected.
pub fn build_proxy_base(req: &RawRequest, path_prefix: &str) -> String {
    let proto = req.header("x-forwarded-proto").unwrap_or("https");
    let host = req.header("host").unwrap_or("");
    if host.is_empty() {
        return String::new();
    }

    let combined: Vec<&str> = [req.header("x-forwarded-prefix").unwrap_or(""), path_prefix]
        .into_iter()
        .map(normalize_prefix)
        .filter(|s| !s.is_empty())
        .collect();

    if combined.is_empty() {
        format!("{proto}://{host}")
    } else {
        format!("{proto}://{host}/{}", combined.join("/"))
    }
}
