//! Sitemap generation from the static routes, CRM listings and CMS posts.

use chrono::NaiveDate;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::Serialize;
use tracing::{error, info};
use url::Url;

use crate::cms::CmsApi;
use crate::cms::client::MAX_POSTS_PER_PAGE;
use crate::core::config::AppConfig;
use crate::core::models::{Post, PostQuery, Property};
use crate::crm::CrmApi;
use crate::errors::RelayError;
use crate::search::filters::{MAX_TAKE, SearchFilters};
use crate::search::normalize::normalize_page;
use crate::utils::text::xml_escape;

/// Upper bound on upstream pages fetched per source.
const MAX_PAGES: u32 = 10;

const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// (path, changefreq, priority)
const STATIC_ROUTES: &[(&str, &str, f32)] = &[
    ("", "daily", 1.0),
    ("properties", "daily", 0.9),
    ("blog", "weekly", 0.7),
    ("sell", "monthly", 0.6),
    ("contact", "monthly", 0.5),
    ("favorites", "monthly", 0.3),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alternate {
    pub hreflang: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: Option<String>,
    pub changefreq: &'static str,
    pub priority: f32,
    pub alternates: Vec<Alternate>,
}

/// Absolute URL of `path` in `lang`. The default language has no prefix.
#[must_use]
pub fn localized_url(site: &Url, lang: &str, default_lang: &str, path: &str) -> String {
    let root = site.as_str().trim_end_matches('/');
    let path = path.trim_matches('/');
    match (lang == default_lang, path.is_empty()) {
        (true, true) => format!("{root}/"),
        (true, false) => format!("{root}/{path}"),
        (false, true) => format!("{root}/{lang}"),
        (false, false) => format!("{root}/{lang}/{path}"),
    }
}

fn entries_for(
    config: &AppConfig,
    path: &str,
    lastmod: Option<String>,
    changefreq: &'static str,
    priority: f32,
) -> Vec<SitemapEntry> {
    let default_lang = config.default_language();
    let alternates: Vec<Alternate> = config
        .languages
        .iter()
        .map(|lang| Alternate {
            hreflang: lang.clone(),
            href: localized_url(&config.site_url, lang, default_lang, path),
        })
        .chain(std::iter::once(Alternate {
            hreflang: "x-default".to_string(),
            href: localized_url(&config.site_url, default_lang, default_lang, path),
        }))
        .collect();

    config
        .languages
        .iter()
        .map(|lang| SitemapEntry {
            loc: localized_url(&config.site_url, lang, default_lang, path),
            lastmod: lastmod.clone(),
            changefreq,
            priority,
            alternates: alternates.clone(),
        })
        .collect()
}

/// `YYYY-MM-DD` prefix of an upstream timestamp, if it has one.
fn date_part(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    let date = raw.get(..10)?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

/// Build every sitemap entry, one per route and language.
#[must_use]
pub fn build_sitemap(
    config: &AppConfig,
    properties: &[Property],
    posts: &[Post],
    today: NaiveDate,
) -> Vec<SitemapEntry> {
    let today = today.format("%Y-%m-%d").to_string();
    let mut entries = Vec::new();

    for &(path, changefreq, priority) in STATIC_ROUTES {
        entries.extend(entries_for(config, path, Some(today.clone()), changefreq, priority));
    }

    for property in properties {
        let path = format!(
            "properties/{}",
            utf8_percent_encode(&property.slug, PATH_SEGMENT)
        );
        let priority = if property.featured { 0.8 } else { 0.7 };
        entries.extend(entries_for(
            config,
            &path,
            date_part(property.updated_at.as_deref()),
            "weekly",
            priority,
        ));
    }

    for post in posts {
        let path = format!("blog/{}", utf8_percent_encode(&post.slug, PATH_SEGMENT));
        let lastmod = date_part(post.modified.as_deref().or(post.date.as_deref()));
        entries.extend(entries_for(config, &path, lastmod, "monthly", 0.6));
    }

    entries
}

#[must_use]
pub fn render_xml(entries: &[SitemapEntry]) -> String {
    let mut xml = String::from(concat!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
        "<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\" ",
        "xmlns:xhtml=\"http://www.w3.org/1999/xhtml\">\n",
    ));
    for entry in entries {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", xml_escape(&entry.loc)));
        if let Some(lastmod) = &entry.lastmod {
            xml.push_str(&format!("    <lastmod>{}</lastmod>\n", xml_escape(lastmod)));
        }
        xml.push_str(&format!("    <changefreq>{}</changefreq>\n", entry.changefreq));
        xml.push_str(&format!("    <priority>{:.1}</priority>\n", entry.priority));
        for alt in &entry.alternates {
            xml.push_str(&format!(
                "    <xhtml:link rel=\"alternate\" hreflang=\"{}\" href=\"{}\"/>\n",
                xml_escape(&alt.hreflang),
                xml_escape(&alt.href)
            ));
        }
        xml.push_str("  </url>\n");
    }
    xml.push_str("</urlset>\n");
    xml
}

#[must_use]
pub fn robots_txt(site: &Url) -> String {
    let root = site.as_str().trim_end_matches('/');
    format!("User-agent: *\nAllow: /\nDisallow: /api/\n\nSitemap: {root}/sitemap.xml\n")
}

async fn fetch_all_properties(
    crm: &dyn CrmApi,
    lang: &str,
) -> Result<Vec<Property>, RelayError> {
    let mut properties = Vec::new();
    let mut filters = SearchFilters {
        take: MAX_TAKE,
        lang: Some(lang.to_string()),
        ..SearchFilters::default()
    };

    for _ in 0..MAX_PAGES {
        let body = crm.search_properties(&filters.to_upstream_params()).await?;
        let page = normalize_page(&body, filters.skip, filters.take, Some(lang));
        let fetched = page.properties.len();
        properties.extend(page.properties);
        if fetched == 0 || properties.len() as u64 >= page.total {
            break;
        }
        filters.skip = filters.skip.saturating_add(filters.take);
    }
    Ok(properties)
}

async fn fetch_all_posts(cms: &dyn CmsApi, lang: &str) -> Result<Vec<Post>, RelayError> {
    let mut posts = Vec::new();
    let mut query = PostQuery {
        page: 1,
        per_page: MAX_POSTS_PER_PAGE,
        category: None,
        lang: Some(lang.to_string()),
    };

    while query.page <= MAX_PAGES {
        let page = cms.list_posts(&query).await?;
        let fetched = page.posts.len();
        posts.extend(page.posts);
        if fetched == 0 || u64::from(query.page) >= page.total_pages {
            break;
        }
        query.page += 1;
    }
    Ok(posts)
}

/// Fetch listings and posts concurrently and build the sitemap.
///
/// A failing source is logged and left out; the static routes and the
/// other source are still served.
pub async fn collect_sitemap(
    crm: &dyn CrmApi,
    cms: &dyn CmsApi,
    config: &AppConfig,
) -> Vec<SitemapEntry> {
    let lang = config.default_language();
    let (properties, posts) =
        futures::join!(fetch_all_properties(crm, lang), fetch_all_posts(cms, lang));

    let properties = properties.unwrap_or_else(|e| {
        error!("Sitemap: failed to fetch listings: {}", e);
        Vec::new()
    });
    let posts = posts.unwrap_or_else(|e| {
        error!("Sitemap: failed to fetch posts: {}", e);
        Vec::new()
    });
    info!(
        properties = properties.len(),
        posts = posts.len(),
        "Sitemap sources fetched"
    );

    build_sitemap(config, &properties, &posts, chrono::Utc::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::base_url;
    use crate::search::normalize::normalize_property;
    use serde_json::json;

    fn config() -> AppConfig {
        AppConfig::with_endpoints("https://crm.test", "https://cms.test", "https://www.site.test")
            .unwrap()
    }

    #[test]
    fn localized_urls() {
        let site = base_url("https://www.site.test").unwrap();
        assert_eq!(localized_url(&site, "es", "es", ""), "https://www.site.test/");
        assert_eq!(localized_url(&site, "en", "es", ""), "https://www.site.test/en");
        assert_eq!(
            localized_url(&site, "en", "es", "/properties/x-1/"),
            "https://www.site.test/en/properties/x-1"
        );
    }

    #[test]
    fn static_routes_in_every_language() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let entries = build_sitemap(&config(), &[], &[], today);
        assert_eq!(entries.len(), STATIC_ROUTES.len() * 2);
        assert_eq!(entries[0].loc, "https://www.site.test/");
        assert_eq!(entries[1].loc, "https://www.site.test/en");
        assert_eq!(entries[0].lastmod.as_deref(), Some("2024-06-01"));
        let hreflangs: Vec<&str> = entries[0]
            .alternates
            .iter()
            .map(|a| a.hreflang.as_str())
            .collect();
        assert_eq!(hreflangs, vec!["es", "en", "x-default"]);
    }

    #[test]
    fn property_routes_use_slug_and_updated_date() {
        let property = normalize_property(
            &json!({
                "id": 4,
                "title": "Casa <grande>",
                "updated_at": "2024-03-09T08:00:00Z",
                "featured": true
            }),
            None,
        )
        .unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let entries = build_sitemap(&config(), &[property], &[], today);
        let detail: Vec<&SitemapEntry> = entries
            .iter()
            .filter(|e| e.loc.contains("/properties/"))
            .collect();
        assert_eq!(detail.len(), 2);
        assert_eq!(detail[0].loc, "https://www.site.test/properties/casa-grande-4");
        assert_eq!(detail[0].lastmod.as_deref(), Some("2024-03-09"));
        assert!((detail[0].priority - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn xml_is_escaped_and_well_formed() {
        let entries = vec![SitemapEntry {
            loc: "https://www.site.test/blog/a&b".to_string(),
            lastmod: None,
            changefreq: "monthly",
            priority: 0.6,
            alternates: vec![],
        }];
        let xml = render_xml(&entries);
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<loc>https://www.site.test/blog/a&amp;b</loc>"));
        assert!(xml.contains("<priority>0.6</priority>"));
        assert!(!xml.contains("<lastmod>"));
        assert!(xml.trim_end().ends_with("</urlset>"));
    }

    #[test]
    fn robots_points_to_sitemap() {
        let robots = robots_txt(&base_url("https://www.site.test").unwrap());
        assert!(robots.contains("Sitemap: https://www.site.test/sitemap.xml"));
        assert!(robots.contains("Disallow: /api/"));
    }

    #[test]
    fn date_part_rejects_garbage() {
        assert_eq!(date_part(Some("2024-01-02 10:00")), Some("2024-01-02".to_string()));
        assert_eq!(date_part(Some("yesterday")), None);
        assert_eq!(date_part(None), None);
    }
}
