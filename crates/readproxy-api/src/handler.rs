//! The request router.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::{error, info};

use readproxy_core::{
    build_proxy_base, resolve_target, ArticleExtractor, ImageConverter, NoopGuard, PageRenderer,
    ProcessGuard, ProxyError, RawRequest, RenderOutcome,
};
use readproxy_render::{build_article_html, build_welcome_page};
use readproxy_rewrite::rewrite_document;

/// Routes one request to the image, welcome or render branch and maps
/// every failure to the proper status and message.
pub struct ProxyHandler {
    renderer: Arc<dyn PageRenderer>,
    extractor: Arc<dyn ArticleExtractor>,
    images: Arc<dyn ImageConverter>,
    guard: Arc<dyn ProcessGuard>,
}

impl ProxyHandler {
    pub fn new(
        renderer: Arc<dyn PageRenderer>,
        extractor: Arc<dyn ArticleExtractor>,
        images: Arc<dyn ImageConverter>,
    ) -> Self {
        Self {
            renderer,
            extractor,
            images,
            guard: Arc::new(NoopGuard),
        }
    }

    /// Install a process guard, armed after each render and cancelled
    /// on the next request.
    pub fn with_guard(mut self, guard: Arc<dyn ProcessGuard>) -> Self {
        self.guard = guard;
        self
    }

    pub async fn handle(&self, req: &RawRequest) -> RenderOutcome {
        self.guard.cancel();

        info!(
            raw_path = %req.raw_path,
            raw_query_string = %req.raw_query_string,
            "incoming request"
        );

        let lower_path = req.raw_path.to_ascii_lowercase();
        if lower_path == "/favicon.ico" || lower_path.ends_with("/favicon.ico") {
            return RenderOutcome::empty(204, "no-store");
        }

        let normalized = match resolve_target(&req.raw_path, &req.raw_query_string) {
            Ok(normalized) => normalized,
            Err(e) => return RenderOutcome::error(400, e.to_string()),
        };

        let segments = normalized.prefix_segments();
        let last_segment = segments.last().map(|s| s.to_ascii_lowercase());
        let is_jpg = last_segment.as_deref() == Some("jpg");
        let is_full_page = matches!(last_segment.as_deref(), Some("url") | Some("urls"));

        let proxy_base = build_proxy_base(req, &normalized.path_prefix);
        // The routing segment is ours, not part of the base links are
        // rebuilt on.
        let link_rewrite_base = if is_full_page {
            build_proxy_base(req, &segments[..segments.len() - 1].join("/"))
        } else {
            proxy_base.clone()
        };

        if is_jpg {
            return self.serve_image(normalized.target_url.as_deref()).await;
        }

        let Some(target_url) = normalized.target_url.as_deref() else {
            return RenderOutcome::html(200, build_welcome_page(&proxy_base), "no-store");
        };

        info!(
            target_url,
            path_prefix = %normalized.path_prefix,
            proxy_base = %link_rewrite_base,
            full_page = is_full_page,
            "rendering target"
        );

        let outcome = match self
            .render(target_url, &link_rewrite_base, is_full_page)
            .await
        {
            Ok(html) => RenderOutcome::html(200, html, "max-age=3600"),
            Err(e) => {
                error!(target_url, "rendering failed: {}", e);
                RenderOutcome::error(500, format!("Failed to render: {e}"))
            }
        };

        self.guard.arm();
        outcome
    }

    async fn serve_image(&self, target_url: Option<&str>) -> RenderOutcome {
        let Some(url) = target_url else {
            return RenderOutcome::error(500, "Failed to convert image: no image URL in the path");
        };

        match self.images.fetch_jpeg(url).await {
            Ok(image) => RenderOutcome::binary(
                BASE64.encode(&image.bytes),
                &image.content_type,
                "max-age=86400",
            ),
            Err(e) => {
                error!(url, "image fetch or conversion failed: {}", e);
                RenderOutcome::error(500, format!("Failed to convert image: {e}"))
            }
        }
    }

    async fn render(
        &self,
        target_url: &str,
        proxy_base: &str,
        full_page: bool,
    ) -> Result<String, ProxyError> {
        let page = self.renderer.render(target_url).await?;

        let jpg_base = if proxy_base.is_empty() {
            String::new()
        } else {
            format!("{proxy_base}/jpg")
        };

        if full_page {
            if proxy_base.is_empty() {
                return Ok(page);
            }
            return rewrite_document(&page, proxy_base, &jpg_base, target_url)
                .map_err(|e| ProxyError::Render(e.to_string()));
        }

        let article = self.extractor.extract(&page, target_url)?;
        let content = if proxy_base.is_empty() {
            article.content
        } else {
            rewrite_document(&article.content, proxy_base, &jpg_base, target_url)
                .map_err(|e| ProxyError::Render(e.to_string()))?
        };

        Ok(build_article_html(&article.title, &content))
    }
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
