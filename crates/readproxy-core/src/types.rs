//! Request and response types crossing the system boundary.

use std::collections::HashMap;

/// One inbound request as delivered by the front door.
///
/// Header names are expected to be lower-case; the HTTP adapter takes
/// care of that before the router sees the request.
#[derive(Debug, Clone, Default)]
pub struct RawRequest {
    pub raw_path: String,
    pub raw_query_string: String,
    pub headers: HashMap<String, String>,
}

impl RawRequest {
    pub fn new(raw_path: impl Into<String>) -> Self {
        Self {
            raw_path: raw_path.into(),
            ..Self::default()
        }
    }

    pub fn with_query(mut self, raw_query_string: impl Into<String>) -> Self {
        self.raw_query_string = raw_query_string.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Look up a header by its lower-case name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Result of resolving the raw path into a target URL.
///
/// `target_url` is `None` only for the empty/root path (welcome case).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTarget {
    pub target_url: Option<String>,
    pub path_prefix: String,
}

impl NormalizedTarget {
    /// Non-empty segments of the path prefix.
    pub fn prefix_segments(&self) -> Vec<&str> {
        self.path_prefix.split('/').filter(|s| !s.is_empty()).collect()
    }
}

/// The only value returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutcome {
    pub status_code: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl RenderOutcome {
    /// An HTML response with the given cache policy.
    pub fn html(status_code: u16, body: impl Into<String>, cache_control: &str) -> Self {
        Self {
            status_code,
            headers: vec![
                ("Content-Type".to_string(), "text/html; charset=utf-8".to_string()),
                ("Cache-Control".to_string(), cache_control.to_string()),
            ],
            body: body.into(),
            is_base64_encoded: false,
        }
    }

    /// A plain-text error response, no cache headers.
    pub fn error(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            headers: Vec::new(),
            body: message.into(),
            is_base64_encoded: false,
        }
    }

    /// An empty response carrying only a cache policy.
    pub fn empty(status_code: u16, cache_control: &str) -> Self {
        Self {
            status_code,
            headers: vec![("Cache-Control".to_string(), cache_control.to_string())],
            body: String::new(),
            is_base64_encoded: false,
        }
    }

    /// A base64-encoded binary response.
    pub fn binary(body: String, content_type: &str, cache_control: &str) -> Self {
        Self {
            status_code: 200,
            headers: vec![
                ("Content-Type".to_string(), content_type.to_string()),
                ("Cache-Control".to_string(), cache_control.to_string()),
            ],
            body,
            is_base64_encoded: true,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
