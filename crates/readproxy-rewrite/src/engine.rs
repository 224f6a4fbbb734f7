//! Per-element rewrite policy and the streaming pass.

use lol_html::{element, HtmlRewriter, Settings};
use thiserror::Error;
use tracing::warn;
use url::Url;

use readproxy_core::constants::UNSUPPORTED_SCHEMES;

use crate::encode::encode_uri;
use crate::srcset::rewrite_srcset;

/// Element types whose `src`/`srcset` loads a resource rather than
/// navigates.
const ASSET_TAGS: [&str; 11] = [
    "img", "picture", "source", "video", "audio", "track", "iframe", "embed", "object", "script",
    "link",
];

/// Asset tags that are routed through the JPEG-conversion route when
/// it is enabled.
const IMAGE_TAGS: [&str; 2] = ["img", "source"];

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("invalid origin URL: {0}")]
    Origin(#[from] url::ParseError),

    #[error("HTML rewriting failed: {0}")]
    Rewrite(String),

    #[error("rewritten document was not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// What to do with one attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RewriteDecision {
    /// Unsupported scheme or already-proxied value; keep it verbatim.
    Leave,
    /// Navigational reference: absolutize, then re-proxy.
    ProxyAbsolute,
    /// Image asset with JPEG routing enabled: absolutize, then route
    /// through the conversion sub-route.
    ProxyJpg,
    /// Asset load left direct: absolutize only.
    AbsolutizeOnly,
}

struct RewriteContext {
    proxy_base: String,
    jpg_proxy_base: String,
    origin: Url,
}

impl RewriteContext {
    fn absolutize(&self, value: &str) -> Option<String> {
        match self.origin.join(value) {
            Ok(url) => Some(url.to_string()),
            Err(err) => {
                warn!(value, %err, "failed to absolutize URL, leaving untouched");
                None
            }
        }
    }

    fn already_proxied(&self, value: &str) -> bool {
        !self.proxy_base.is_empty() && value.starts_with(&self.proxy_base)
    }

    fn jpg_enabled(&self) -> bool {
        !self.jpg_proxy_base.is_empty()
    }

    fn decide(&self, tag: &str, is_href: bool, value: &str) -> RewriteDecision {
        if has_unsupported_scheme(value) || self.already_proxied(value) {
            return RewriteDecision::Leave;
        }
        if is_href || !is_asset_tag(tag) {
            return RewriteDecision::ProxyAbsolute;
        }
        if is_image_tag(tag) && self.jpg_enabled() {
            RewriteDecision::ProxyJpg
        } else {
            RewriteDecision::AbsolutizeOnly
        }
    }

    /// `srcset` always names a resource load, so it is never
    /// re-proxied as a navigational link, whatever the tag.
    fn decide_srcset(&self, tag: &str, value: &str) -> RewriteDecision {
        if has_unsupported_scheme(value) || self.already_proxied(value) {
            return RewriteDecision::Leave;
        }
        if is_image_tag(tag) && self.jpg_enabled() {
            RewriteDecision::ProxyJpg
        } else {
            RewriteDecision::AbsolutizeOnly
        }
    }

    fn apply(&self, decision: RewriteDecision, value: &str) -> Option<String> {
        let absolute = match decision {
            RewriteDecision::Leave => return None,
            _ => self.absolutize(value)?,
        };
        match decision {
            RewriteDecision::Leave => None,
            RewriteDecision::ProxyAbsolute => {
                Some(format!("{}/{}", self.proxy_base, encode_uri(&absolute)))
            }
            RewriteDecision::ProxyJpg => {
                Some(format!("{}/{}", self.jpg_proxy_base, encode_uri(&absolute)))
            }
            RewriteDecision::AbsolutizeOnly => Some(absolute),
        }
    }
}

fn is_asset_tag(tag: &str) -> bool {
    ASSET_TAGS.contains(&tag)
}

fn is_image_tag(tag: &str) -> bool {
    IMAGE_TAGS.contains(&tag)
}

fn has_unsupported_scheme(value: &str) -> bool {
    match value.split_once(':') {
        Some((scheme, _)) => {
            let scheme = format!("{}:", scheme.to_ascii_lowercase());
            UNSUPPORTED_SCHEMES.contains(&scheme.as_str())
        }
        None => false,
    }
}

/// Rewrite every navigable and asset reference in `html`.
///
/// `proxy_base` must be non-empty (the router skips rewriting
/// entirely for direct invocations); an empty `jpg_proxy_base`
/// disables image re-routing. `origin_url` is the pre-render target
/// URL used to resolve relative references.
pub fn rewrite_document(
    html: &str,
    proxy_base: &str,
    jpg_proxy_base: &str,
    origin_url: &str,
) -> Result<String, RewriteError> {
    let ctx = RewriteContext {
        proxy_base: proxy_base.trim_end_matches('/').to_string(),
        jpg_proxy_base: jpg_proxy_base.trim_end_matches('/').to_string(),
        origin: Url::parse(origin_url)?,
    };

    let mut output = Vec::with_capacity(html.len());
    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![
                element!("*[href]", |el| {
                    if let Some(value) = el.get_attribute("href") {
                        let tag = el.tag_name().to_ascii_lowercase();
                        let decision = ctx.decide(&tag, true, &value);
                        if let Some(rewritten) = ctx.apply(decision, &value) {
                            el.set_attribute("href", &rewritten)?;
                        }
                    }
                    Ok(())
                }),
                element!("*[src]", |el| {
                    let Some(value) = el.get_attribute("src") else {
                        return Ok(());
                    };
                    let tag = el.tag_name().to_ascii_lowercase();
                    // An element carrying both attributes keeps href as
                    // its navigational reference; only asset tags get
                    // their src touched as well.
                    if el.has_attribute("href") && !is_asset_tag(&tag) {
                        return Ok(());
                    }
                    let decision = ctx.decide(&tag, false, &value);
                    if let Some(rewritten) = ctx.apply(decision, &value) {
                        el.set_attribute("src", &rewritten)?;
                    }
                    Ok(())
                }),
                element!("*[srcset]", |el| {
                    let Some(value) = el.get_attribute("srcset") else {
                        return Ok(());
                    };
                    let tag = el.tag_name().to_ascii_lowercase();
                    let rewritten = rewrite_srcset(&value, |entry_url| {
                        match ctx.decide_srcset(&tag, entry_url) {
                            RewriteDecision::Leave => Some(entry_url.to_string()),
                            decision => ctx.apply(decision, entry_url),
                        }
                    });
                    if let Some(rewritten) = rewritten {
                        el.set_attribute("srcset", &rewritten)?;
                    }
                    Ok(())
                }),
            ],
            ..Settings::default()
        },
        |chunk: &[u8]| output.extend_from_slice(chunk),
    );

    rewriter
        .write(html.as_bytes())
        .map_err(|e| RewriteError::Rewrite(e.to_string()))?;
    rewriter
        .end()
        .map_err(|e| RewriteError::Rewrite(e.to_string()))?;

    Ok(String::from_utf8(output)?)
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
