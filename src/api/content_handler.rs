//! CMS relays: popups, blog posts, zones and taxonomies.

use serde_json::{Value, json};

use super::handler::AppState;
use super::helpers::ok_json;
use super::parsing::Request;
use crate::core::models::PostQuery;
use crate::errors::RelayError;

const DEFAULT_POSTS_PER_PAGE: u32 = 9;

fn parse_id(raw: Option<&str>) -> Result<u64, RelayError> {
    let raw = raw.ok_or_else(|| RelayError::MissingField("id".to_string()))?;
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| {
            RelayError::InvalidInput(format!("id must be a positive integer, got '{raw}'"))
        })
}

/// `GET /api/popup/{id}` or `GET /api/popup?id=`
///
/// # Errors
///
/// 400 for a missing or non-numeric id, 404 for unknown popups.
pub async fn handle_popup(
    state: &AppState,
    id: Option<&str>,
    request: &Request,
) -> Result<Value, RelayError> {
    let id = parse_id(id.or_else(|| request.param("id")))?;
    let popup = state.cms.get_popup(id).await?;
    Ok(ok_json(&popup))
}

/// `GET /api/posts?page=&per_page=&category=&lang=`
///
/// # Errors
///
/// Upstream failures.
pub async fn handle_posts(state: &AppState, request: &Request) -> Result<Value, RelayError> {
    let number = |key: &str| request.param(key).and_then(|v| v.parse::<u64>().ok());
    let query = PostQuery {
        page: number("page")
            .and_then(|p| u32::try_from(p).ok())
            .unwrap_or(1),
        per_page: number("per_page")
            .and_then(|p| u32::try_from(p).ok())
            .unwrap_or(DEFAULT_POSTS_PER_PAGE),
        category: number("category"),
        lang: request.param("lang").map(str::to_string),
    };
    let page = state.cms.list_posts(&query).await?;
    Ok(ok_json(&page))
}

/// `GET /api/posts/{slug}`
///
/// # Errors
///
/// 404 for unknown slugs, upstream failures.
pub async fn handle_post(
    state: &AppState,
    slug: &str,
    request: &Request,
) -> Result<Value, RelayError> {
    let post = state.cms.get_post_by_slug(slug, request.param("lang")).await?;
    Ok(ok_json(&json!({ "post": post })))
}

/// `GET /api/zones`
///
/// # Errors
///
/// Upstream failures.
pub async fn handle_zones(state: &AppState) -> Result<Value, RelayError> {
    let zones = state.cms.list_zones().await?;
    Ok(ok_json(&json!({ "zones": zones })))
}

/// `GET /api/taxonomies/{kind}`
///
/// # Errors
///
/// 404 for taxonomies outside the allowed list, upstream failures.
pub async fn handle_terms(state: &AppState, kind: &str) -> Result<Value, RelayError> {
    let terms = state.cms.list_terms(kind).await?;
    Ok(ok_json(&json!({ "taxonomy": kind, "terms": terms })))
}
