//! URI encoding for re-proxied links.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Everything a browser-style `encodeURI` escapes: controls, space,
/// the quoting/bracketing characters, and `%` itself. URI-reserved
/// characters (`;,/?:@&=+$` and friends) pass through so the embedded
/// target URL stays readable in the proxied path.
const ENCODE_URI_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'|')
    .add(b'\\')
    .add(b'^')
    .add(b'[')
    .add(b']')
    .add(b'%');

/// Percent-encode an absolute URL for embedding in a proxied path.
pub fn encode_uri(value: &str) -> String {
    utf8_percent_encode(value, ENCODE_URI_SET).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_reserved_characters() {
        assert_eq!(
            encode_uri("https://example.com/foo?bar=baz&x=1#frag"),
            "https://example.com/foo?bar=baz&x=1#frag"
        );
    }

    #[test]
    fn escapes_spaces_and_quotes() {
        assert_eq!(encode_uri("https://e.com/a b\"c"), "https://e.com/a%20b%22c");
    }

    #[test]
    fn escapes_existing_percent_signs() {
        // A percent-encoded input gains one more layer, which the
        // resolver's single decode pass strips on the way back in.
        assert_eq!(encode_uri("https://e.com/a%20b"), "https://e.com/a%2520b");
    }

    #[test]
    fn escapes_non_ascii() {
        assert_eq!(encode_uri("https://e.com/ü"), "https://e.com/%C3%BC");
    }
}
