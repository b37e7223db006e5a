//! Site-level routes: public config, CRM origins, sitemap and robots file.

use serde_json::{Value, json};

use super::handler::AppState;
use super::helpers::{ok_json, text_response};
use crate::errors::RelayError;
use crate::seo::{collect_sitemap, render_xml, robots_txt};

/// `GET /api/site-config`: what the browser needs to boot analytics and
/// the language/currency pickers.
#[must_use]
pub fn handle_site_config(state: &AppState) -> Value {
    let config = &state.config;
    ok_json(&json!({
        "siteUrl": config.site_url.as_str().trim_end_matches('/'),
        "languages": config.languages,
        "defaultLanguage": config.default_language(),
        "currencies": config.currencies,
        "analytics": config.analytics,
    }))
}

/// `GET /api/origins`
///
/// # Errors
///
/// Upstream failures.
pub async fn handle_origins(state: &AppState) -> Result<Value, RelayError> {
    let origins = state.crm.list_origins().await?;
    Ok(ok_json(&json!({ "origins": origins })))
}

/// `GET /api/sitemap`
pub async fn handle_sitemap_json(state: &AppState) -> Value {
    let entries = collect_sitemap(state.crm.as_ref(), state.cms.as_ref(), &state.config).await;
    ok_json(&json!({ "count": entries.len(), "routes": entries }))
}

/// `GET /sitemap.xml`
pub async fn handle_sitemap_xml(state: &AppState) -> Value {
    let entries = collect_sitemap(state.crm.as_ref(), state.cms.as_ref(), &state.config).await;
    text_response(200, "application/xml; charset=utf-8", render_xml(&entries))
}

/// `GET /robots.txt`
#[must_use]
pub fn handle_robots(state: &AppState) -> Value {
    text_response(
        200,
        "text/plain; charset=utf-8",
        robots_txt(&state.config.site_url),
    )
}
