//! Readable rendering: article extraction plus the HTML shells the
//! proxy serves.

mod extractor;
mod templates;

pub use extractor::ReadabilityExtractor;
pub use templates::{build_article_html, build_welcome_page, escape_html};
