//! Listing filters as the site sends them, and their CRM parameter mapping.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

pub const DEFAULT_TAKE: u32 = 12;
pub const MAX_TAKE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Sale,
    Rent,
}

impl Operation {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sale" | "buy" | "venta" | "comprar" => Some(Self::Sale),
            "rent" | "alquiler" | "alquilar" => Some(Self::Rent),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_upstream(self) -> &'static str {
        match self {
            Self::Sale => "sale",
            Self::Rent => "rent",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    AreaDesc,
}

impl SortOrder {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "newest" | "recent" | "date" => Some(Self::Newest),
            "price_asc" | "price-asc" | "cheapest" => Some(Self::PriceAsc),
            "price_desc" | "price-desc" => Some(Self::PriceDesc),
            "area_desc" | "area-desc" | "largest" => Some(Self::AreaDesc),
            _ => None,
        }
    }

    /// `(order_by, order)` pair understood by the CRM.
    #[must_use]
    pub fn as_upstream(self) -> (&'static str, &'static str) {
        match self {
            Self::Newest => ("updated_at", "desc"),
            Self::PriceAsc => ("price", "asc"),
            Self::PriceDesc => ("price", "desc"),
            Self::AreaDesc => ("area", "desc"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchFilters {
    pub operation: Option<Operation>,
    pub property_type: Option<String>,
    pub zone: Option<String>,
    pub city: Option<String>,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub min_bedrooms: Option<u32>,
    pub min_bathrooms: Option<u32>,
    pub min_area: Option<u32>,
    pub max_area: Option<u32>,
    pub features: Vec<String>,
    pub reference: Option<String>,
    pub sort: SortOrder,
    pub skip: u32,
    pub take: u32,
    pub lang: Option<String>,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            operation: None,
            property_type: None,
            zone: None,
            city: None,
            min_price: None,
            max_price: None,
            min_bedrooms: None,
            min_bathrooms: None,
            min_area: None,
            max_area: None,
            features: Vec::new(),
            reference: None,
            sort: SortOrder::default(),
            skip: 0,
            take: DEFAULT_TAKE,
            lang: None,
        }
    }
}

impl SearchFilters {
    /// Build filters from decoded query parameters.
    ///
    /// Values that do not parse are dropped rather than rejected: a stale
    /// bookmark with `minPrice=abc` still gets results.
    #[must_use]
    pub fn from_query(params: &HashMap<String, String>) -> Self {
        let text = |key: &str| {
            params
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty() && *v != "all" && *v != "any")
                .map(str::to_string)
        };
        let number = |key: &str| params.get(key).and_then(|v| parse_number(v));

        let take = number("take")
            .or_else(|| number("limit"))
            .map_or(DEFAULT_TAKE, |t| clamp_u32(t).clamp(1, MAX_TAKE));
        let skip = match (number("skip"), number("page")) {
            (Some(skip), _) => clamp_u32(skip),
            (None, Some(page)) if page > 1 => clamp_u32(page - 1).saturating_mul(take),
            _ => 0,
        };

        let (min_price, max_price) = ordered(number("minPrice"), number("maxPrice"));
        let (min_area, max_area) = ordered(number("minArea"), number("maxArea"));

        Self {
            operation: params.get("operation").and_then(|v| Operation::parse(v)),
            property_type: text("type").map(|t| t.to_ascii_lowercase()),
            zone: text("zone"),
            city: text("city"),
            min_price,
            max_price,
            min_bedrooms: number("bedrooms").map(clamp_u32),
            min_bathrooms: number("bathrooms").map(clamp_u32),
            min_area: min_area.map(clamp_u32),
            max_area: max_area.map(clamp_u32),
            features: params
                .get("features")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|f| !f.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            reference: text("ref"),
            sort: params
                .get("sort")
                .and_then(|v| SortOrder::parse(v))
                .unwrap_or_default(),
            skip,
            take,
            lang: text("lang").map(|l| l.to_ascii_lowercase()),
        }
    }

    /// Build filters from the `filters` object of a POST body. Scalars are
    /// read like query values and arrays are comma joined, so both entry
    /// points accept the same keys.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        let mut params = HashMap::new();
        if let Some(map) = value.as_object() {
            for (key, val) in map {
                let rendered = match val {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    Value::Bool(b) => Some(b.to_string()),
                    Value::Array(items) => Some(
                        items
                            .iter()
                            .filter_map(|i| match i {
                                Value::String(s) => Some(s.clone()),
                                Value::Number(n) => Some(n.to_string()),
                                _ => None,
                            })
                            .collect::<Vec<_>>()
                            .join(","),
                    ),
                    Value::Null | Value::Object(_) => None,
                };
                if let Some(rendered) = rendered {
                    params.insert(key.clone(), rendered);
                }
            }
        }
        Self::from_query(&params)
    }

    /// The CRM search parameters, in a stable order, unset values omitted.
    #[must_use]
    pub fn to_upstream_params(&self) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = Vec::new();
        let mut push = |key: &str, value: String| out.push((key.to_string(), value));

        if let Some(op) = self.operation {
            push("transaction", op.as_upstream().to_string());
        }
        if let Some(t) = &self.property_type {
            push("type", t.clone());
        }
        if let Some(z) = &self.zone {
            push("zone", z.clone());
        }
        if let Some(c) = &self.city {
            push("city", c.clone());
        }
        if let Some(v) = self.min_price {
            push("price_min", v.to_string());
        }
        if let Some(v) = self.max_price {
            push("price_max", v.to_string());
        }
        if let Some(v) = self.min_bedrooms {
            push("bedrooms_min", v.to_string());
        }
        if let Some(v) = self.min_bathrooms {
            push("bathrooms_min", v.to_string());
        }
        if let Some(v) = self.min_area {
            push("area_min", v.to_string());
        }
        if let Some(v) = self.max_area {
            push("area_max", v.to_string());
        }
        if !self.features.is_empty() {
            push("features", self.features.join(","));
        }
        if let Some(r) = &self.reference {
            push("reference", r.clone());
        }
        let (order_by, order) = self.sort.as_upstream();
        push("order_by", order_by.to_string());
        push("order", order.to_string());
        push("skip", self.skip.to_string());
        push("take", self.take.to_string());
        if let Some(l) = &self.lang {
            push("lang", l.clone());
        }

        out
    }
}

/// `350.000`, `1,250,000`: digits in groups of three after the first.
static THOUSANDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,3}(?:[.,]\d{3})+$")
        .unwrap_or_else(|_| Regex::new(r"$^").expect("fallback regex compiles"))
});

/// Non-negative whole number from a query value. Thousand separators are
/// dropped, decimals keep their integer part (`1.5` is `1`), anything else
/// is `None`.
fn parse_number(raw: &str) -> Option<u64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '_'))
        .collect();
    if THOUSANDS_RE.is_match(&cleaned) {
        return cleaned
            .chars()
            .filter(char::is_ascii_digit)
            .collect::<String>()
            .parse()
            .ok();
    }
    if let Ok(n) = cleaned.parse::<u64>() {
        return Some(n);
    }
    cleaned
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite() && *n >= 0.0 && *n < u64::MAX as f64)
        .map(|n| n.trunc() as u64)
}

fn clamp_u32(v: u64) -> u32 {
    u32::try_from(v).unwrap_or(u32::MAX)
}

/// Swap a reversed range instead of returning nothing.
fn ordered(min: Option<u64>, max: Option<u64>) -> (Option<u64>, Option<u64>) {
    match (min, max) {
        (Some(a), Some(b)) if a > b => (Some(b), Some(a)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn page_and_limit_become_skip_take() {
        let f = SearchFilters::from_query(&query(&[("page", "3"), ("limit", "20")]));
        assert_eq!(f.take, 20);
        assert_eq!(f.skip, 40);
    }

    #[test]
    fn explicit_skip_wins_over_page() {
        let f = SearchFilters::from_query(&query(&[("page", "3"), ("skip", "5")]));
        assert_eq!(f.skip, 5);
        assert_eq!(f.take, DEFAULT_TAKE);
    }

    #[test]
    fn take_is_clamped() {
        let f = SearchFilters::from_query(&query(&[("take", "5000")]));
        assert_eq!(f.take, MAX_TAKE);
        let f = SearchFilters::from_query(&query(&[("take", "0")]));
        assert_eq!(f.take, 1);
    }

    #[test]
    fn bad_numbers_are_ignored() {
        let f = SearchFilters::from_query(&query(&[("minPrice", "abc"), ("bedrooms", "-1")]));
        assert_eq!(f.min_price, None);
        assert_eq!(f.min_bedrooms, None);
    }

    #[test]
    fn price_with_thousand_separators() {
        let f = SearchFilters::from_query(&query(&[("maxPrice", "350.000")]));
        assert_eq!(f.max_price, Some(350_000));
        let f = SearchFilters::from_query(&query(&[("maxPrice", "1,250,000")]));
        assert_eq!(f.max_price, Some(1_250_000));
        let f = SearchFilters::from_query(&query(&[("minPrice", "200 000")]));
        assert_eq!(f.min_price, Some(200_000));
    }

    #[test]
    fn decimals_keep_their_integer_part() {
        let f = SearchFilters::from_query(&query(&[
            ("bathrooms", "1.5"),
            ("minArea", "75.5"),
            ("maxArea", "120,25"),
        ]));
        assert_eq!(f.min_bathrooms, Some(1));
        assert_eq!(f.min_area, Some(75));
        assert_eq!(f.max_area, Some(120));

        let params = f.to_upstream_params();
        assert!(params.contains(&("bathrooms_min".to_string(), "1".to_string())));
        assert!(params.contains(&("area_min".to_string(), "75".to_string())));
    }

    #[test]
    fn malformed_numbers_are_dropped() {
        for raw in ["1.2.3", "12.34.567", "-3.5", "NaN", "inf", "3e400", "1,5,6"] {
            assert_eq!(parse_number(raw), None, "{raw}");
        }
    }

    #[test]
    fn reversed_range_is_swapped() {
        let f =
            SearchFilters::from_query(&query(&[("minPrice", "500000"), ("maxPrice", "100000")]));
        assert_eq!(f.min_price, Some(100_000));
        assert_eq!(f.max_price, Some(500_000));
    }

    #[test]
    fn placeholder_values_are_unset() {
        let f = SearchFilters::from_query(&query(&[("type", "all"), ("zone", "")]));
        assert_eq!(f.property_type, None);
        assert_eq!(f.zone, None);
    }

    #[test]
    fn operation_aliases() {
        assert_eq!(Operation::parse("Venta"), Some(Operation::Sale));
        assert_eq!(Operation::parse("alquiler"), Some(Operation::Rent));
        assert_eq!(Operation::parse("swap"), None);
    }

    #[test]
    fn json_filters_match_query_filters() {
        let from_json = SearchFilters::from_json(&json!({
            "operation": "rent",
            "type": "Apartment",
            "minPrice": 800,
            "features": ["pool", "garage"],
            "page": 2,
            "ignored": {"nested": true}
        }));
        let from_query = SearchFilters::from_query(&query(&[
            ("operation", "rent"),
            ("type", "Apartment"),
            ("minPrice", "800"),
            ("features", "pool,garage"),
            ("page", "2"),
        ]));
        assert_eq!(from_json, from_query);
        assert_eq!(from_json.property_type.as_deref(), Some("apartment"));
        assert_eq!(from_json.skip, DEFAULT_TAKE);
    }

    #[test]
    fn upstream_params_default_set() {
        let params = SearchFilters::default().to_upstream_params();
        assert_eq!(
            params,
            vec![
                ("order_by".to_string(), "updated_at".to_string()),
                ("order".to_string(), "desc".to_string()),
                ("skip".to_string(), "0".to_string()),
                ("take".to_string(), "12".to_string()),
            ]
        );
    }

    #[test]
    fn upstream_params_full_set_in_order() {
        let f = SearchFilters::from_query(&query(&[
            ("operation", "alquiler"),
            ("type", "Chalet"),
            ("zone", "Centro"),
            ("city", "Málaga"),
            ("minPrice", "900"),
            ("maxPrice", "2.500"),
            ("bedrooms", "3"),
            ("bathrooms", "2"),
            ("minArea", "80"),
            ("maxArea", "200"),
            ("features", "pool, garage"),
            ("ref", "MAL-042"),
            ("sort", "price_desc"),
            ("page", "3"),
            ("limit", "24"),
            ("lang", "EN"),
            ("utm_source", "newsletter"),
        ]));
        let pairs = |items: &[(&str, &str)]| -> Vec<(String, String)> {
            items
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect()
        };

        assert_eq!(
            f.to_upstream_params(),
            pairs(&[
                ("transaction", "rent"),
                ("type", "chalet"),
                ("zone", "Centro"),
                ("city", "Málaga"),
                ("price_min", "900"),
                ("price_max", "2500"),
                ("bedrooms_min", "3"),
                ("bathrooms_min", "2"),
                ("area_min", "80"),
                ("area_max", "200"),
                ("features", "pool,garage"),
                ("reference", "MAL-042"),
                ("order_by", "price"),
                ("order", "desc"),
                ("skip", "48"),
                ("take", "24"),
                ("lang", "en"),
            ])
        );
    }
}
