//! Favorites are kept by the browser as a JSON array of listing ids; the
//! relay only resolves them into listings.

use futures::future::join_all;
use serde_json::Value;
use tracing::warn;

use crate::core::models::Property;
use crate::crm::CrmApi;
use crate::errors::RelayError;
use crate::search::normalize::{normalize_property, unwrap_record};

pub const MAX_FAVORITES: usize = 50;

/// Parse the stored favorites value. Numbers and numeric strings are
/// accepted; order is kept and duplicates dropped.
///
/// # Errors
///
/// `InvalidInput` if the value is not an array, holds a non-numeric entry,
/// or has more than [`MAX_FAVORITES`] distinct ids.
pub fn parse_favorite_ids(value: &Value) -> Result<Vec<u64>, RelayError> {
    let items = value
        .as_array()
        .ok_or_else(|| RelayError::InvalidInput("ids must be an array".to_string()))?;

    let mut ids: Vec<u64> = Vec::with_capacity(items.len());
    for item in items {
        let id = match item {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        }
        .filter(|id| *id > 0)
        .ok_or_else(|| RelayError::InvalidInput(format!("invalid listing id: {item}")))?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    if ids.len() > MAX_FAVORITES {
        return Err(RelayError::InvalidInput(format!(
            "at most {MAX_FAVORITES} ids per request"
        )));
    }
    Ok(ids)
}

/// Fetch the listings concurrently. Listings the CRM no longer has are
/// skipped; any other failure fails the whole request.
///
/// # Errors
///
/// The first non-`NotFound` error returned by the CRM.
pub async fn resolve_favorites(
    crm: &dyn CrmApi,
    ids: &[u64],
    lang: Option<&str>,
) -> Result<Vec<Property>, RelayError> {
    let results = join_all(ids.iter().map(|id| crm.get_property(*id))).await;

    let mut properties = Vec::with_capacity(ids.len());
    for (id, result) in ids.iter().zip(results) {
        match result {
            Ok(body) => properties.push(normalize_property(unwrap_record(&body), lang)?),
            Err(RelayError::NotFound(_)) => warn!(id, "Favorite listing no longer exists"),
            Err(e) => return Err(e),
        }
    }
    Ok(properties)
}
