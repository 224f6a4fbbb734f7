//! Article extraction with a whole-body fallback.

use std::io::Cursor;

use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use readproxy_core::{Article, ArticleExtractor, ProxyError};

const DEFAULT_TITLE: &str = "Saved article";

/// Runs readability over the rendered document. Pages the algorithm
/// cannot make sense of fall back to the raw body, so the reader
/// always gets something.
#[derive(Debug, Default)]
pub struct ReadabilityExtractor;

impl ReadabilityExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl ArticleExtractor for ReadabilityExtractor {
    fn extract(&self, html: &str, target_url: &str) -> Result<Article, ProxyError> {
        let url = Url::parse(target_url).map_err(|e| ProxyError::Render(e.to_string()))?;

        let mut cursor = Cursor::new(html.as_bytes());
        let product = match readability::extractor::extract(&mut cursor, &url) {
            Ok(product) if !product.content.trim().is_empty() => Some(product),
            Ok(_) => {
                debug!(target_url, "readability produced empty content");
                None
            }
            Err(e) => {
                debug!(target_url, "readability failed: {}", e);
                None
            }
        };

        let document = Html::parse_document(html);

        let title = product
            .as_ref()
            .map(|p| p.title.trim().to_string())
            .filter(|t| !t.is_empty())
            .or_else(|| document_title(&document))
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        let content = match product {
            Some(product) => product.content,
            None => body_inner_html(&document),
        };

        Ok(Article { title, content })
    }
}

fn document_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let title = document
        .select(&selector)
        .next()?
        .text()
        .collect::<String>()
        .trim()
        .to_string();
    (!title.is_empty()).then_some(title)
}

fn body_inner_html(document: &Html) -> String {
    Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .map(|body| body.inner_html())
        .unwrap_or_default()
}
