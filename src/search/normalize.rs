//! Reshape CRM listing JSON into [`Property`] records.
//!
//! The CRM has changed field names across API versions (Spanish names on
//! older accounts), so every field is looked up under a list of aliases.

use serde_json::Value;

use crate::core::models::{Property, SearchPage};
use crate::errors::RelayError;
use crate::utils::slug::property_slug;

pub const DEFAULT_CURRENCY: &str = "EUR";

const ID: &[&str] = &["id", "id_property", "cod_ofer"];
const REFERENCE: &[&str] = &["reference", "ref", "referencia"];
const SLUG: &[&str] = &["slug"];
const TITLE: &[&str] = &["title", "titulo", "name"];
const DESCRIPTION: &[&str] = &["description", "descripcion", "desc"];
const OPERATION: &[&str] = &["transaction", "operation", "operacion"];
const TYPE: &[&str] = &["type", "property_type", "tipo"];
const PRICE: &[&str] = &["price", "precio"];
const CURRENCY: &[&str] = &["currency", "moneda"];
const BEDROOMS: &[&str] = &["bedrooms", "habitaciones", "rooms"];
const BATHROOMS: &[&str] = &["bathrooms", "banos", "baths"];
const AREA: &[&str] = &["area", "m2", "surface", "metros"];
const ZONE: &[&str] = &["zone", "zona"];
const CITY: &[&str] = &["city", "ciudad", "localidad"];
const LATITUDE: &[&str] = &["latitude", "lat", "latitud"];
const LONGITUDE: &[&str] = &["longitude", "lng", "lon", "longitud"];
const IMAGES: &[&str] = &["images", "fotos", "photos", "pictures"];
const FEATURES: &[&str] = &["features", "extras", "caracteristicas"];
const FEATURED: &[&str] = &["featured", "destacado", "highlighted"];
const UPDATED: &[&str] = &["updated_at", "fecha_modificacion", "modified"];

const TOTAL: &[&str] = &["total", "count", "total_count"];
const ITEMS: &[&str] = &["items", "data", "properties", "results"];

fn first<'a>(record: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| record.get(*k))
        .find(|v| !v.is_null())
}

fn text(record: &Value, keys: &[&str]) -> Option<String> {
    let value = first(record, keys)?;
    let rendered = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        // Multilingual fields arrive as {"es": "...", "en": "..."}.
        Value::Object(map) => map.values().find_map(|v| v.as_str())?.trim().to_string(),
        _ => return None,
    };
    (!rendered.is_empty()).then_some(rendered)
}

fn localized(record: &Value, keys: &[&str], lang: Option<&str>) -> Option<String> {
    if let (Some(lang), Some(Value::Object(map))) = (lang, first(record, keys))
        && let Some(s) = map.get(lang).and_then(Value::as_str)
        && !s.trim().is_empty()
    {
        return Some(s.trim().to_string());
    }
    text(record, keys)
}

fn number(record: &Value, keys: &[&str]) -> Option<f64> {
    match first(record, keys)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    }
}

fn count(record: &Value, keys: &[&str]) -> Option<u32> {
    number(record, keys)
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n.round() as u32)
}

fn flag(record: &Value, keys: &[&str]) -> bool {
    match first(record, keys) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
        Some(Value::String(s)) => matches!(s.trim(), "1" | "true" | "yes" | "si" | "sí"),
        _ => false,
    }
}

fn string_list(record: &Value, keys: &[&str], object_keys: &[&str]) -> Vec<String> {
    let Some(Value::Array(items)) = first(record, keys) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Object(_) => text(item, object_keys),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect()
}

/// Reshape one CRM listing.
///
/// # Errors
///
/// Returns `ParseError` when the record has no usable numeric id.
pub fn normalize_property(record: &Value, lang: Option<&str>) -> Result<Property, RelayError> {
    let id = number(record, ID)
        .filter(|n| n.is_finite() && *n > 0.0 && n.fract() == 0.0)
        .map(|n| n as u64)
        .ok_or_else(|| RelayError::ParseError("listing without id".to_string()))?;

    let property_type = text(record, TYPE).map(|t| t.to_ascii_lowercase());
    let city = text(record, CITY);
    let zone = text(record, ZONE);

    let title = localized(record, TITLE, lang).unwrap_or_else(|| {
        match (&property_type, city.as_ref().or(zone.as_ref())) {
            (Some(t), Some(place)) => format!("{} in {place}", capitalize(t)),
            _ => format!("Property {id}"),
        }
    });

    let price = number(record, PRICE).filter(|p| p.is_finite() && *p > 0.0);
    // Detail lookups read the id back from the slug, so CRM slugs get it too.
    let slug = property_slug(text(record, SLUG).as_deref().unwrap_or(&title), id);

    Ok(Property {
        id,
        reference: text(record, REFERENCE),
        slug,
        title,
        description: localized(record, DESCRIPTION, lang).unwrap_or_default(),
        operation: text(record, OPERATION).map(|o| o.to_ascii_lowercase()),
        property_type,
        price_on_request: price.is_none(),
        price,
        currency: text(record, CURRENCY)
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        bedrooms: count(record, BEDROOMS),
        bathrooms: count(record, BATHROOMS),
        area: number(record, AREA).filter(|a| a.is_finite() && *a > 0.0),
        zone,
        city,
        latitude: number(record, LATITUDE),
        longitude: number(record, LONGITUDE),
        images: string_list(record, IMAGES, &["url", "src", "large"]),
        features: string_list(record, FEATURES, &["name", "label"]),
        featured: flag(record, FEATURED),
        updated_at: text(record, UPDATED),
    })
}

/// Reshape the CRM search envelope. Listings that fail to normalize are
/// skipped and logged; the page keeps the upstream total.
#[must_use]
pub fn normalize_page(body: &Value, skip: u32, take: u32, lang: Option<&str>) -> SearchPage {
    let items: &[Value] = match body {
        Value::Array(items) => items.as_slice(),
        _ => first(body, ITEMS)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default(),
    };

    let properties: Vec<Property> = items
        .iter()
        .filter_map(|item| match normalize_property(item, lang) {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!("Skipping CRM listing: {}", e);
                None
            }
        })
        .collect();

    let total = number(body, TOTAL)
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map_or(properties.len() as u64, |n| n as u64);

    SearchPage {
        total,
        skip,
        take,
        properties,
    }
}

/// Unwrap a detail response that may be enveloped as `{"data": {...}}`.
#[must_use]
pub fn unwrap_record(body: &Value) -> &Value {
    match first(body, &["data", "property", "item"]) {
        Some(inner @ Value::Object(_)) => inner,
        _ => body,
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renames_spanish_fields() {
        let record = json!({
            "cod_ofer": 42,
            "referencia": "MAL-042",
            "titulo": {"es": "Ático con vistas", "en": "Penthouse with views"},
            "precio": "325000",
            "habitaciones": 3,
            "banos": "2",
            "m2": 110.5,
            "ciudad": "Málaga",
            "fotos": [{"url": "https://img.test/1.jpg"}, "", "https://img.test/2.jpg"],
            "destacado": 1
        });
        let p = normalize_property(&record, Some("en")).unwrap();
        assert_eq!(p.id, 42);
        assert_eq!(p.reference.as_deref(), Some("MAL-042"));
        assert_eq!(p.title, "Penthouse with views");
        assert_eq!(p.price, Some(325_000.0));
        assert!(!p.price_on_request);
        assert_eq!(p.bedrooms, Some(3));
        assert_eq!(p.bathrooms, Some(2));
        assert_eq!(p.area, Some(110.5));
        assert_eq!(p.currency, "EUR");
        assert_eq!(
            p.images,
            vec!["https://img.test/1.jpg".to_string(), "https://img.test/2.jpg".to_string()]
        );
        assert!(p.featured);
        assert_eq!(p.slug, "penthouse-with-views-42");
    }

    #[test]
    fn defaults_are_substituted() {
        let record = json!({"id": 7, "type": "Villa", "city": "Marbella", "price": 0});
        let p = normalize_property(&record, None).unwrap();
        assert_eq!(p.title, "Villa in Marbella");
        assert!(p.price_on_request);
        assert_eq!(p.price, None);
        assert_eq!(p.slug, "villa-in-marbella-7");
        assert!(p.images.is_empty());

        let bare = normalize_property(&json!({"id": "9"}), None).unwrap();
        assert_eq!(bare.title, "Property 9");
    }

    #[test]
    fn crm_slug_gets_the_listing_id() {
        let p = normalize_property(&json!({"id": 42, "slug": "atico-con-vistas"}), None).unwrap();
        assert_eq!(p.slug, "atico-con-vistas-42");

        let p = normalize_property(&json!({"id": 7, "slug": "casa-2024"}), None).unwrap();
        assert_eq!(p.slug, "casa-2024-7");

        let p = normalize_property(&json!({"id": 8, "slug": "Piso-Centro-8"}), None).unwrap();
        assert_eq!(p.slug, "piso-centro-8");
    }

    #[test]
    fn record_without_id_is_rejected() {
        assert!(normalize_property(&json!({"title": "x"}), None).is_err());
        assert!(normalize_property(&json!({"id": 1.5}), None).is_err());
    }

    #[test]
    fn page_skips_bad_items_and_keeps_total() {
        let body = json!({
            "count": 31,
            "data": [{"id": 1}, {"title": "no id"}, {"id": 2}]
        });
        let page = normalize_page(&body, 12, 12, None);
        assert_eq!(page.total, 31);
        assert_eq!(page.properties.len(), 2);
        assert_eq!(page.skip, 12);
    }

    #[test]
    fn bare_array_body() {
        let page = normalize_page(&json!([{"id": 1}]), 0, 12, None);
        assert_eq!(page.total, 1);
    }

    #[test]
    fn unwraps_envelope() {
        let body = json!({"data": {"id": 3}});
        assert_eq!(unwrap_record(&body), &json!({"id": 3}));
        let flat = json!({"id": 3});
        assert_eq!(unwrap_record(&flat), &flat);
    }
}
