//! Plain-text helpers for CMS content.

/// Width handed to the HTML renderer; large enough that it never wraps.
const RENDER_WIDTH: usize = 10_000;

pub const EXCERPT_LEN: usize = 160;

/// Render an HTML fragment to a single line of plain text.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    let rendered = html2text::config::plain()
        .string_from_read(html.as_bytes(), RENDER_WIDTH)
        .unwrap_or_else(|_| html.to_string());
    collapse_whitespace(&rendered)
}

#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut `text` to at most `max` characters on a word boundary, appending `…`
/// when something was cut.
#[must_use]
pub fn excerpt(text: &str, max: usize) -> String {
    let text = collapse_whitespace(text);
    if text.chars().count() <= max {
        return text;
    }

    let mut out = String::new();
    for word in text.split(' ') {
        let needed = if out.is_empty() { word.chars().count() } else { word.chars().count() + 1 };
        if out.chars().count() + needed > max.saturating_sub(1) {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }

    if out.is_empty() {
        out = text.chars().take(max.saturating_sub(1)).collect();
    }
    let trimmed = out.trim_end_matches(|c: char| matches!(c, ',' | ';' | ':' | '.' | '-'));
    format!("{trimmed}…")
}

/// Escape the five XML special characters.
#[must_use]
pub fn xml_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
