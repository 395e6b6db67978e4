//! HTML escaping for comment text.

/// Escape the HTML-sensitive characters in `text` and turn spaces into
/// non-breaking spaces.
///
/// Only literal characters are replaced: `&` inside an existing entity is
/// escaped like any other ampersand, and every other character (including
/// multi-code-point graphemes) passes through untouched.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            ' ' => escaped.push_str("&nbsp;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
