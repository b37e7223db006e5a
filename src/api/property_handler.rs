//! Property search and lookup relays.

use serde_json::{Value, json};
use tracing::info;

use super::handler::AppState;
use super::helpers::ok_json;
use super::parsing::Request;
use crate::errors::RelayError;
use crate::favorites::{parse_favorite_ids, resolve_favorites};
use crate::search::filters::SearchFilters;
use crate::search::normalize::{normalize_page, normalize_property, unwrap_record};
use crate::utils::slug::id_from_slug;

/// `GET /api/properties?...`
///
/// # Errors
///
/// Upstream failures of the CRM search call.
pub async fn handle_search(state: &AppState, request: &Request) -> Result<Value, RelayError> {
    let filters = SearchFilters::from_query(&request.query);
    search(state, &filters).await
}

async fn search(state: &AppState, filters: &SearchFilters) -> Result<Value, RelayError> {
    let params = filters.to_upstream_params();
    let body = state.crm.search_properties(&params).await?;
    let page = normalize_page(&body, filters.skip, filters.take, filters.lang.as_deref());
    info!(
        total = page.total,
        returned = page.properties.len(),
        "Property search relayed"
    );
    Ok(ok_json(&page))
}

/// `GET /api/properties/{ref}` where `ref` is a numeric id or a slug ending in one.
///
/// # Errors
///
/// `InvalidInput` for a reference without an id, `NotFound` or upstream errors.
pub async fn handle_detail(
    state: &AppState,
    reference: &str,
    request: &Request,
) -> Result<Value, RelayError> {
    let id = id_from_slug(reference)
        .ok_or_else(|| RelayError::InvalidInput(format!("no listing id in '{reference}'")))?;
    detail(state, id, request.param("lang")).await
}

async fn detail(state: &AppState, id: u64, lang: Option<&str>) -> Result<Value, RelayError> {
    let body = state.crm.get_property(id).await?;
    let property = normalize_property(unwrap_record(&body), lang)?;
    Ok(ok_json(&json!({ "property": property })))
}

/// `POST /api/properties` with one of:
/// `{"slug": "..."}`, `{"id": 12}`, `{"ids": [..]}` or `{"filters": {..}}`.
///
/// # Errors
///
/// `InvalidInput` for an unrecognized body, otherwise as the chosen lookup.
pub async fn handle_lookup(state: &AppState, request: &Request) -> Result<Value, RelayError> {
    let body = request.json_body()?;
    let lang = body
        .get("lang")
        .and_then(Value::as_str)
        .or_else(|| request.param("lang"))
        .map(str::to_string);

    if let Some(slug) = body.get("slug").and_then(Value::as_str) {
        let id = id_from_slug(slug)
            .ok_or_else(|| RelayError::InvalidInput(format!("no listing id in slug '{slug}'")))?;
        return detail(state, id, lang.as_deref()).await;
    }

    if let Some(id) = body.get("id") {
        let id = id
            .as_u64()
            .or_else(|| id.as_str().and_then(|s| s.trim().parse().ok()))
            .ok_or_else(|| RelayError::InvalidInput("id must be numeric".to_string()))?;
        return detail(state, id, lang.as_deref()).await;
    }

    if let Some(ids) = body.get("ids") {
        let ids = parse_favorite_ids(ids)?;
        let properties = resolve_favorites(state.crm.as_ref(), &ids, lang.as_deref()).await?;
        return Ok(ok_json(&json!({ "properties": properties })));
    }

    if let Some(filters) = body.get("filters") {
        let mut filters = SearchFilters::from_json(filters);
        if filters.lang.is_none() {
            filters.lang = lang;
        }
        return search(state, &filters).await;
    }

    Err(RelayError::InvalidInput(
        "expected one of slug, id, ids or filters".to_string(),
    ))
}
