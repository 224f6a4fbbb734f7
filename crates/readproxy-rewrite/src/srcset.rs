//! `srcset` attribute handling.

/// Rewrite a `srcset` value entry by entry.
///
/// Entries are comma-separated `(url, descriptor?)` pairs. Each URL is
/// mapped through `map`; descriptors (`1x`, `480w`, ...) are preserved
/// verbatim. Entries whose URL maps to `None` are dropped; if nothing
/// survives, `None` is returned and the caller leaves the attribute
/// untouched.
pub fn rewrite_srcset(value: &str, mut map: impl FnMut(&str) -> Option<String>) -> Option<String> {
    let entries: Vec<String> = value
        .split(',')
        .filter_map(|part| {
            let mut tokens = part.trim().split_whitespace();
            let url = tokens.next()?;
            let descriptor = tokens.next();
            let mapped = map(url)?;
            Some(match descriptor {
                Some(descriptor) => format!("{mapped} {descriptor}"),
                None => mapped,
            })
        })
        .collect();

    if entries.is_empty() {
        None
    } else {
        Some(entries.join(", "))
    }
}
