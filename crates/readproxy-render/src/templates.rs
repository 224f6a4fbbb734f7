//! HTML shells served by the proxy.

/// Reading styles inlined into every article page so it renders
/// self-contained.
const MINIMAL_STYLES: &str = r#"
  body { font-family: 'Georgia', 'Times New Roman', serif; margin: 1.5rem auto; max-width: 740px; padding: 0 1rem; background: #f9f9f9; color: #222; }
  article { background: #fff; padding: 1.25rem; border-radius: 12px; box-shadow: 0 6px 20px rgba(0,0,0,0.08); }
  h1 { font-size: 1.8rem; line-height: 1.25; margin-bottom: 0.75rem; }
  h2, h3, h4 { margin-top: 1.25rem; line-height: 1.3; }
  p { line-height: 1.6; margin: 0.85rem 0; font-size: 1rem; }
  img, picture, video { max-width: 100%; height: auto; display: block; margin: 1rem auto; }
  figure { margin: 1rem auto; }
  figcaption { font-size: 0.9rem; color: #555; text-align: center; }
  a { color: #0067c5; text-decoration: none; }
  a:hover { text-decoration: underline; }
  ul, ol { padding-left: 1.25rem; }
  blockquote { border-left: 4px solid #ddd; padding-left: 0.75rem; color: #555; }
  code { background: #f2f2f2; padding: 0.15rem 0.25rem; border-radius: 4px; font-size: 0.95rem; }
  table { width: 100%; border-collapse: collapse; margin: 1rem 0; }
  th, td { border: 1px solid #c9ced6; padding: 0.55rem 0.75rem; }
  th { background: #f2f4f7; text-align: left; }
"#;

const WELCOME_TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>Welcome to the Proxy</title>
  <style>
    body { font-family: 'Inter', system-ui, -apple-system, sans-serif; margin: 0; padding: 0; background: #f6f8fb; color: #1f2933; display: flex; justify-content: center; align-items: center; min-height: 100vh; }
    .card { background: #fff; padding: 1.75rem; border-radius: 16px; box-shadow: 0 10px 40px rgba(0,0,0,0.08); width: min(560px, 92vw); }
    h1 { font-size: 1.8rem; margin: 0 0 0.35rem; }
    form { display: flex; gap: 0.6rem; margin-top: 0.75rem; }
    input[type="search"] { flex: 1; padding: 0.85rem 1rem; border: 1px solid #d4d8dd; border-radius: 12px; font-size: 1rem; transition: border-color 0.2s, box-shadow 0.2s; }
    input[type="search"]:focus { outline: none; border-color: #2563eb; box-shadow: 0 0 0 3px rgba(37, 99, 235, 0.18); }
    button { padding: 0.85rem 1.1rem; border: none; border-radius: 12px; background: linear-gradient(135deg, #2563eb, #1d4ed8); color: #fff; font-weight: 600; cursor: pointer; transition: transform 0.1s ease, box-shadow 0.2s ease; }
    button:hover { transform: translateY(-1px); box-shadow: 0 8px 18px rgba(37, 99, 235, 0.24); }
  </style>
</head>
<body>
  <main class="card" aria-labelledby="welcome-title">
    <h1 id="welcome-title">Search or paste a link</h1>
    <form id="search-form" action="@BASE_ATTR@/https://duckduckgo.com/" method="get">
      <input id="search-input" type="search" name="q" placeholder="Search DuckDuckGo or paste https:// URL" required />
      <button type="submit">Search</button>
    </form>
  </main>
  <script>
    const proxyBase = @BASE_JSON@;
    const form = document.getElementById('search-form');
    const input = document.getElementById('search-input');

    form?.addEventListener('submit', (event) => {
      const query = input?.value?.trim() || '';

      if (query.toLowerCase().startsWith('https://')) {
        event.preventDefault();
        const encodedUrl = encodeURIComponent(query);
        const destination = proxyBase + '/' + encodedUrl;
        window.location.href = destination;
      }
    });
  </script>
</body>
</html>"#;

/// Escape text for interpolation into an HTML context.
pub fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Wrap extracted article content in a minimal, self-contained page.
/// `body_html` is already-sanitized markup and goes in verbatim.
pub fn build_article_html(title: &str, body_html: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8" />
<meta name="viewport" content="width=device-width, initial-scale=1" />
<title>{title}</title>
<style>{styles}</style>
</head>
<body>
  <article>
    <h1>{title}</h1>
    {body_html}
  </article>
</body>
</html>"#,
        title = escape_html(title),
        styles = MINIMAL_STYLES,
        body_html = body_html,
    )
}

/// The search page served when no target URL is in the path.
pub fn build_welcome_page(proxy_base: &str) -> String {
    // JSON-encode for the inline script so the base survives quoting.
    let base_json =
        serde_json::to_string(proxy_base).unwrap_or_else(|_| "\"\"".to_string());
    WELCOME_TEMPLATE
        .replace("@BASE_ATTR@", proxy_base)
        .replace("@BASE_JSON@", &base_json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_html_metacharacters() {
        assert_eq!(
            escape_html(r#"<b>"fish" & 'chips'</b>"#),
            "&lt;b&gt;&quot;fish&quot; &amp; &#39;chips&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn article_page_escapes_title_but_not_body() {
        let html = build_article_html("Tom & Jerry <3", "<p>body</p>");
        assert!(html.contains("<title>Tom &amp; Jerry &lt;3</title>"));
        assert!(html.contains("<h1>Tom &amp; Jerry &lt;3</h1>"));
        assert!(html.contains("<p>body</p>"));
    }

    #[test]
    fn article_page_inlines_styles() {
        let html = build_article_html("t", "");
        assert!(html.contains("font-family: 'Georgia'"));
    }

    #[test]
    fn welcome_page_points_search_at_the_proxy() {
        let html = build_welcome_page("https://proxy.test/prefix");
        assert!(html.contains(r#"action="https://proxy.test/prefix/https://duckduckgo.com/""#));
        assert!(html.contains(r#"const proxyBase = "https://proxy.test/prefix";"#));
    }

    #[test]
    fn welcome_page_handles_empty_base() {
        let html = build_welcome_page("");
        assert!(html.contains(r#"action="/https://duckduckgo.com/""#));
        assert!(html.contains(r#"const proxyBase = "";"#));
    }
}
