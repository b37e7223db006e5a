use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use url::Url;

/// Extract stylesheet and script URLs referenced by an HTML fragment.
///
/// Only `<link rel="stylesheet" href>` / `<link rel="preload" href>` and
/// `<script src>` are considered. Inline `<style>` and `<script>` bodies
/// are left in the HTML untouched.
#[must_use]
pub fn extract_asset_links(html: &str) -> Vec<String> {
    static LINK_TAG_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
        Regex::new(r"(?is)<link\b[^>]*>")
            .unwrap_or_else(|_| Regex::new(r"$^").expect("fallback regex compiles"))
    });
    static SCRIPT_TAG_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
        Regex::new(r"(?is)<script\b[^>]*>")
            .unwrap_or_else(|_| Regex::new(r"$^").expect("fallback regex compiles"))
    });

    let mut out: Vec<String> = Vec::new();

    for tag in LINK_TAG_RE.find_iter(html) {
        let tag = tag.as_str();
        let rel = attribute(tag, "rel").unwrap_or_default().to_ascii_lowercase();
        if rel.split_whitespace().any(|r| r == "stylesheet" || r == "preload")
            && let Some(href) = attribute(tag, "href")
        {
            out.push(href);
        }
    }

    for tag in SCRIPT_TAG_RE.find_iter(html) {
        if let Some(src) = attribute(tag.as_str(), "src") {
            out.push(src);
        }
    }

    out
}

/// Collect every string under `assets`-like keys of a CMS payload.
///
/// The CMS may send either a flat list of URLs or a map of handle -> URL,
/// sometimes nested per kind (`{"styles": {...}, "scripts": [...]}`).
#[must_use]
pub fn extract_links_from_json_value(v: &Value) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    walk_value_for_links(v, &mut out);
    out
}

fn walk_value_for_links(node: &Value, out: &mut Vec<String>) {
    match node {
        Value::String(s) => {
            let s = s.trim();
            if s.starts_with("http://") || s.starts_with("https://") || s.starts_with("//") {
                out.push(s.to_string());
            }
        }
        Value::Array(arr) => {
            for item in arr {
                walk_value_for_links(item, out);
            }
        }
        Value::Object(map) => {
            for (_, val) in map {
                walk_value_for_links(val, out);
            }
        }
        _ => {}
    }
}

/// Resolve against `base`, drop fragments, and dedupe while keeping order.
#[must_use]
pub fn normalize_and_dedupe_links<I>(raw_links: I, base: &Url) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut out: Vec<String> = Vec::new();

    for raw in raw_links {
        if let Some(norm) = normalize_link(raw.trim(), base)
            && seen.insert(norm.clone())
        {
            out.push(norm);
        }
    }

    out
}

#[must_use]
fn normalize_link(raw: &str, base: &Url) -> Option<String> {
    let raw = raw.trim_matches(|c: char| matches!(c, '"' | '\''));
    if raw.is_empty() || raw.starts_with("data:") || raw.starts_with("javascript:") {
        return None;
    }

    let mut url = base.join(raw).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url.to_string())
}

fn attribute(tag: &str, name: &str) -> Option<String> {
    static ATTRIBUTE_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
        Regex::new(
            r#"\s([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#,
        )
        .unwrap_or_else(|_| Regex::new(r"$^").expect("fallback regex compiles"))
    });

    ATTRIBUTE_RE
        .captures_iter(tag)
        .find(|caps| caps[1].eq_ignore_ascii_case(name))
        .and_then(|caps| caps.get(2).or_else(|| caps.get(3)).or_else(|| caps.get(4)))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_stylesheets_and_scripts() {
        let html = r#"
            <link rel="stylesheet" href="/wp-content/popup.css?ver=2">
            <link rel='icon' href='/favicon.ico'>
            <script src="https://cdn.example.com/popup.js" defer></script>
            <script>window.inline = true;</script>
            <div class="popup">Hola</div>
        "#;
        let links = extract_asset_links(html);
        assert_eq!(
            links,
            vec![
                "/wp-content/popup.css?ver=2".to_string(),
                "https://cdn.example.com/popup.js".to_string(),
            ]
        );
    }

    #[test]
    fn attributes_match_by_exact_name() {
        let tag = r#"<link data-href="/wrong.css" REL=stylesheet HREF='/right.css'>"#;
        assert_eq!(attribute(tag, "href").as_deref(), Some("/right.css"));
        assert_eq!(attribute(tag, "rel").as_deref(), Some("stylesheet"));
        assert_eq!(attribute(tag, "src"), None);
    }

    #[test]
    fn walks_nested_asset_maps() {
        let v = json!({
            "styles": {"popup": "https://cms.example.com/a.css"},
            "scripts": ["https://cms.example.com/b.js", 42, "not a url"]
        });
        let mut links = extract_links_from_json_value(&v);
        links.sort();
        assert_eq!(
            links,
            vec![
                "https://cms.example.com/a.css".to_string(),
                "https://cms.example.com/b.js".to_string(),
            ]
        );
    }

    #[test]
    fn normalize_resolves_relative_and_dedupes() {
        let base = Url::parse("https://cms.example.com/wp-json/").unwrap();
        let raw = vec![
            "/a.css#x".to_string(),
            "https://cms.example.com/a.css".to_string(),
            "data:text/css;base64,AAAA".to_string(),
            "//cdn.example.com/b.js".to_string(),
        ];
        let norm = normalize_and_dedupe_links(raw, &base);
        assert_eq!(
            norm,
            vec![
                "https://cms.example.com/a.css".to_string(),
                "https://cdn.example.com/b.js".to_string(),
            ]
        );
    }
}
