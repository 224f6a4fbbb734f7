//! Error taxonomy for the proxy.

use thiserror::Error;

/// Failures that cross component boundaries.
///
/// `MissingScheme` and `UnsupportedProtocol` surface as 400 before any
/// browser resource is allocated; `Render` and `ImageConvert` surface
/// as 500 with a prefixed message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProxyError {
    /// No `scheme://` marker anywhere in the request path.
    #[error("A fully-qualified http(s) URL is required in the path.")]
    MissingScheme,

    /// A scheme was found but it is not http or https. Carries the
    /// scheme with its trailing colon, e.g. `ftp:`.
    #[error("Unsupported protocol: {0}")]
    UnsupportedProtocol(String),

    /// Browser render or extraction failure.
    #[error("{0}")]
    Render(String),

    /// Image fetch or JPEG conversion failure.
    #[error("{0}")]
    ImageConvert(String),
}
