//! Reshaping of CMS records (popups, posts, terms).

use serde_json::Value;
use url::Url;

use crate::core::models::{Popup, Post, SeoMeta, Term};
use crate::errors::RelayError;
use crate::utils::json::v_str;
use crate::utils::links::{
    extract_asset_links, extract_links_from_json_value, normalize_and_dedupe_links,
};
use crate::utils::mime::classify_asset;
use crate::utils::text::{EXCERPT_LEN, excerpt, html_to_text};

/// `{"rendered": "..."}` or a bare string.
fn rendered(root: &Value, key: &str) -> Option<String> {
    v_str(root, &[key, "rendered"])
        .or_else(|| v_str(root, &[key]))
        .map(str::to_string)
}

fn id_of(record: &Value) -> Result<u64, RelayError> {
    record
        .get("id")
        .and_then(|v| v.as_u64().or_else(|| v.as_str()?.parse().ok()))
        .ok_or_else(|| RelayError::ParseError("CMS record without id".to_string()))
}

/// Popup with its HTML fragment and the assets referenced by it or listed
/// next to it by the CMS.
///
/// # Errors
///
/// Returns `ParseError` when the record has no id.
pub fn popup_from_value(record: &Value, base: &Url) -> Result<Popup, RelayError> {
    let id = id_of(record)?;
    let html = rendered(record, "content").unwrap_or_default();
    let title = rendered(record, "title")
        .map(|t| html_to_text(&t))
        .unwrap_or_default();

    let mut raw = extract_asset_links(&html);
    if let Some(listed) = record.get("assets") {
        raw.extend(extract_links_from_json_value(listed));
    }
    let assets = normalize_and_dedupe_links(raw, base)
        .into_iter()
        .map(classify_asset)
        .collect();

    Ok(Popup {
        id,
        title,
        html,
        assets,
    })
}

/// # Errors
///
/// Returns `ParseError` when the record has no id or slug.
pub fn post_from_value(record: &Value) -> Result<Post, RelayError> {
    let id = id_of(record)?;
    let slug = v_str(record, &["slug"])
        .ok_or_else(|| RelayError::ParseError(format!("CMS post {id} without slug")))?
        .to_string();
    let title = rendered(record, "title")
        .map(|t| html_to_text(&t))
        .unwrap_or_default();
    let html = rendered(record, "content").unwrap_or_default();
    let excerpt_text = rendered(record, "excerpt")
        .map(|e| html_to_text(&e))
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| html_to_text(&html));
    let excerpt_text = excerpt(&excerpt_text, EXCERPT_LEN);

    let image = v_str(record, &["_embedded", "wp:featuredmedia", "0", "source_url"])
        .or_else(|| v_str(record, &["featured_image_url"]))
        .map(str::to_string);

    let seo = SeoMeta {
        title: v_str(record, &["yoast_head_json", "title"])
            .map_or_else(|| title.clone(), str::to_string),
        description: v_str(record, &["yoast_head_json", "description"])
            .map_or_else(|| excerpt_text.clone(), str::to_string),
        canonical: v_str(record, &["yoast_head_json", "canonical"]).map(str::to_string),
        og_image: v_str(record, &["yoast_head_json", "og_image", "0", "url"])
            .map(str::to_string)
            .or_else(|| image.clone()),
    };

    Ok(Post {
        id,
        slug,
        title,
        excerpt: excerpt_text,
        html,
        date: v_str(record, &["date"]).map(str::to_string),
        modified: v_str(record, &["modified"]).map(str::to_string),
        categories: record
            .get("categories")
            .and_then(Value::as_array)
            .map(|c| c.iter().filter_map(Value::as_u64).collect())
            .unwrap_or_default(),
        image,
        seo,
    })
}

/// # Errors
///
/// Returns `ParseError` when the record has no id.
pub fn term_from_value(record: &Value) -> Result<Term, RelayError> {
    let id = id_of(record)?;
    let name = rendered(record, "name")
        .or_else(|| rendered(record, "title"))
        .map(|n| html_to_text(&n))
        .unwrap_or_default();
    Ok(Term {
        id,
        slug: v_str(record, &["slug"]).map_or_else(|| id.to_string(), str::to_string),
        name,
        count: record.get("count").and_then(Value::as_u64),
        parent: record
            .get("parent")
            .and_then(Value::as_u64)
            .filter(|p| *p != 0),
        extra: record.get("acf").cloned().unwrap_or(Value::Null),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::AssetKind;
    use serde_json::json;

    fn base() -> Url {
        Url::parse("https://cms.example.com/wp-json/wp/v2/").unwrap()
    }

    #[test]
    fn popup_collects_assets_from_html_and_list() {
        let record = json!({
            "id": 31,
            "title": {"rendered": "Oferta &amp; más"},
            "content": {"rendered": concat!(
                "<link rel=\"stylesheet\" href=\"/wp-content/uploads/popup-31.css\">",
                "<div>Hola</div><script src=\"/wp-content/popup.js\"></script>"
            )},
            "assets": {
                "styles": ["https://cms.example.com/wp-content/uploads/popup-31.css"],
                "fonts": ["https://fonts.example.com/inter.woff2"]
            }
        });
        let popup = popup_from_value(&record, &base()).unwrap();
        assert_eq!(popup.id, 31);
        assert_eq!(popup.title, "Oferta & más");
        assert!(popup.html.contains("<div>Hola</div>"));
        let kinds: Vec<AssetKind> = popup.assets.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AssetKind::Style, AssetKind::Script, AssetKind::Font]);
        assert_eq!(popup.assets[0].url, "https://cms.example.com/wp-content/uploads/popup-31.css");
    }

    #[test]
    fn post_falls_back_to_content_for_excerpt_and_seo() {
        let record = json!({
            "id": 5,
            "slug": "comprar-en-malaga",
            "title": {"rendered": "Comprar en Málaga"},
            "content": {"rendered": "<p>Guía completa para comprar vivienda.</p>"},
            "excerpt": {"rendered": ""},
            "date": "2024-05-01T10:00:00",
            "categories": [3, 4],
            "_embedded": {"wp:featuredmedia": [{"source_url": "https://cms.example.com/hero.jpg"}]}
        });
        let post = post_from_value(&record).unwrap();
        assert_eq!(post.excerpt, "Guía completa para comprar vivienda.");
        assert_eq!(post.seo.title, "Comprar en Málaga");
        assert_eq!(post.seo.description, post.excerpt);
        assert_eq!(post.image.as_deref(), Some("https://cms.example.com/hero.jpg"));
        assert_eq!(post.seo.og_image, post.image);
        assert_eq!(post.categories, vec![3, 4]);
    }

    #[test]
    fn post_prefers_seo_plugin_fields() {
        let record = json!({
            "id": 6,
            "slug": "x",
            "title": {"rendered": "X"},
            "content": {"rendered": "<p>body</p>"},
            "yoast_head_json": {
                "title": "X | Agency",
                "description": "Meta",
                "canonical": "https://site.test/blog/x"
            }
        });
        let post = post_from_value(&record).unwrap();
        assert_eq!(post.seo.title, "X | Agency");
        assert_eq!(post.seo.description, "Meta");
        assert_eq!(post.seo.canonical.as_deref(), Some("https://site.test/blog/x"));
    }

    #[test]
    fn term_drops_root_parent() {
        let term = term_from_value(&json!({
            "id": 2, "slug": "centro", "name": "Centro", "count": 12, "parent": 0
        }))
        .unwrap();
        assert_eq!(term.parent, None);
        assert_eq!(term.count, Some(12));
        assert_eq!(term.extra, Value::Null);
    }
}
