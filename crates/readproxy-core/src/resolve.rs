//! Target resolution.
//!
//! Turns the raw request path (plus query string) into the canonical
//! absolute target URL and the path prefix that precedes it. The
//! target URL itself contains slashes and colons, and the service may
//! sit behind any number of gateway base-path layers, so the split
//! point is the first `scheme://` marker found in the decoded path.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ProxyError;
use crate::types::NormalizedTarget;

/// First occurrence of `scheme:/` (one or more slashes), anywhere.
static SCHEME_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[a-z][a-z0-9+.\-]*:/+").expect("scheme marker regex"));

/// Leading `scheme:` of a candidate URL.
static LEADING_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[a-z][a-z0-9+.\-]*:").expect("leading scheme regex"));

/// Resolve the raw path and query string into a normalized target.
///
/// Pure and deterministic. Errors are the two 400-class failures;
/// nothing here allocates browser resources.
pub fn resolve_target(raw_path: &str, raw_query_string: &str) -> Result<NormalizedTarget, ProxyError> {
    let raw_target = if raw_query_string.is_empty() {
        raw_path.to_string()
    } else {
        format!("{raw_path}?{raw_query_string}")
    };

    let trimmed = raw_target.trim_start_matches('/');
    if trimmed.is_empty() {
        return Ok(NormalizedTarget {
            target_url: None,
            path_prefix: String::new(),
        });
    }

    // One decode pass; invalid sequences are carried through rather
    // than rejected.
    let decoded = String::from_utf8_lossy(&urlencoding::decode_binary(trimmed.as_bytes())).into_owned();

    let marker = SCHEME_MARKER.find(&decoded).ok_or(ProxyError::MissingScheme)?;

    let path_prefix = decoded[..marker.start()].trim_end_matches('/').to_string();
    let candidate = repair_scheme_slashes(&decoded[marker.start()..]);

    if let Some(scheme) = LEADING_SCHEME.find(&candidate) {
        let scheme = scheme.as_str().to_ascii_lowercase();
        if scheme != "http:" && scheme != "https:" {
            return Err(ProxyError::UnsupportedProtocol(scheme));
        }
    }

    let target_url = if starts_with_ignore_case(&candidate, "http://")
        || starts_with_ignore_case(&candidate, "https://")
    {
        candidate
    } else {
        format!("https://{candidate}")
    };

    Ok(NormalizedTarget {
        target_url: Some(target_url),
        path_prefix,
    })
}

/// Tolerance rule: a malformed single-slash scheme separator
/// (`https:/host`) is repaired to the canonical double-slash form.
fn repair_scheme_slashes(candidate: &str) -> String {
    for scheme in ["https:", "http:"] {
        if candidate.len() > scheme.len()
            && candidate[..scheme.len()].eq_ignore_ascii_case(scheme)
        {
            let rest = &candidate[scheme.len()..];
            if rest.starts_with('/') && !rest.starts_with("//") {
                return format!("{}/{}", &candidate[..scheme.len()], rest);
            }
        }
    }
    candidate.to_string()
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value.len() >= prefix.len() && value[..prefix.len()].eq_ignore_ascii_case(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_plain_target() {
        let target = resolve_target("/https://example.com/post", "").unwrap();
        assert_eq!(target.target_url.as_deref(), Some("https://example.com/post"));
        assert_eq!(target.path_prefix, "");
    }

    #[test]
    fn recovers_gateway_prefix() {
        let target = resolve_target("/path1/path2/https://example.com/post", "").unwrap();
        assert_eq!(target.target_url.as_deref(), Some("https://example.com/post"));
        assert_eq!(target.path_prefix, "path1/path2");
    }

    #[test]
    fn round_trips_targets_under_arbitrary_prefixes() {
        let urls = [
            "https://example.com/",
            "http://example.com/a/b?c=d",
            "https://example.com/post#frag",
        ];
        let prefixes = ["", "p", "p/q", "stage/v1/urls"];
        for url in urls {
            for prefix in prefixes {
                let raw = if prefix.is_empty() {
                    format!("/{url}")
                } else {
                    format!("/{prefix}/{url}")
                };
                let target = resolve_target(&raw, "").unwrap();
                assert_eq!(target.target_url.as_deref(), Some(url), "raw: {raw}");
                assert_eq!(target.path_prefix, prefix, "raw: {raw}");
            }
        }
    }

    #[test]
    fn repairs_single_slash_scheme() {
        let target = resolve_target("/https:/news.ycombinator.com/news", "").unwrap();
        assert_eq!(
            target.target_url.as_deref(),
            Some("https://news.ycombinator.com/news")
        );
    }

    #[test]
    fn reattaches_query_string() {
        let target = resolve_target("/https://example.com/search", "q=kobo&page=2").unwrap();
        assert_eq!(
            target.target_url.as_deref(),
            Some("https://example.com/search?q=kobo&page=2")
        );
    }

    #[test]
    fn decodes_percent_encoded_paths_once() {
        let target = resolve_target("/https%3A%2F%2Fexample.com%2Fpost", "").unwrap();
        assert_eq!(target.target_url.as_deref(), Some("https://example.com/post"));
    }

    #[test]
    fn rejects_unsupported_protocol() {
        let err = resolve_target("/ftp://example.com/resource", "").unwrap_err();
        assert_eq!(err, ProxyError::UnsupportedProtocol("ftp:".to_string()));
        assert_eq!(err.to_string(), "Unsupported protocol: ftp:");
    }

    #[test]
    fn rejects_paths_without_scheme() {
        let err = resolve_target("/robots.txt", "").unwrap_err();
        assert_eq!(err, ProxyError::MissingScheme);
        assert_eq!(
            err.to_string(),
            "A fully-qualified http(s) URL is required in the path."
        );
    }

    #[test]
    fn root_path_yields_no_target() {
        for raw in ["/", "", "///"] {
            let target = resolve_target(raw, "").unwrap();
            assert_eq!(target.target_url, None);
            assert_eq!(target.path_prefix, "");
        }
    }

    #[test]
    fn route_segment_lands_in_prefix() {
        let target = resolve_target("/jpg/https://example.com/image.png", "").unwrap();
        assert_eq!(target.path_prefix, "jpg");
        assert_eq!(
            target.target_url.as_deref(),
            Some("https://example.com/image.png")
        );
    }

    #[test]
    fn identical_input_identical_output() {
        let a = resolve_target("/x/https://example.com/", "a=1");
        let b = resolve_target("/x/https://example.com/", "a=1");
        assert_eq!(a, b);
    }
}
