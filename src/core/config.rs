use std::collections::BTreeMap;
use std::env;

use url::Url;

use crate::errors::RelayError;

/// Languages served when `SITE_LANGUAGES` is unset. The first one is the default.
pub const DEFAULT_LANGUAGES: &[&str] = &["es", "en"];
pub const DEFAULT_CURRENCIES: &[&str] = &["EUR", "USD", "GBP"];

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub crm_base_url: Url,
    pub crm_api_key: String,
    pub crm_origin_id: Option<u64>,
    /// Lead source -> CRM label id. The `default` key is the fallback.
    pub crm_labels: BTreeMap<String, u64>,
    pub cms_base_url: Url,
    pub cms_api_token: Option<String>,
    pub site_url: Url,
    pub languages: Vec<String>,
    pub currencies: Vec<String>,
    pub analytics: AnalyticsIds,
    pub cors_allow_origin: String,
    pub redirect_rules_json: Option<String>,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct AnalyticsIds {
    pub ga_measurement_id: Option<String>,
    pub gtm_id: Option<String>,
    pub meta_pixel_id: Option<String>,
}

impl AppConfig {
    /// # Errors
    ///
    /// Returns `ConfigError` when a required variable is missing or a value is malformed.
    pub fn from_env() -> Result<Self, RelayError> {
        Ok(Self {
            crm_base_url: base_url(&required("CRM_BASE_URL")?)?,
            crm_api_key: required("CRM_API_KEY")?,
            crm_origin_id: optional("CRM_ORIGIN_ID")
                .map(|v| {
                    v.parse::<u64>()
                        .map_err(|e| RelayError::ConfigError(format!("CRM_ORIGIN_ID: {e}")))
                })
                .transpose()?,
            crm_labels: optional("CRM_LABELS")
                .map(|v| parse_label_map(&v))
                .transpose()?
                .unwrap_or_default(),
            cms_base_url: base_url(&required("CMS_BASE_URL")?)?,
            cms_api_token: optional("CMS_API_TOKEN"),
            site_url: base_url(&required("SITE_URL")?)?,
            languages: optional("SITE_LANGUAGES")
                .map_or_else(|| owned(DEFAULT_LANGUAGES), |v| split_list(&v, false)),
            currencies: optional("SITE_CURRENCIES")
                .map_or_else(|| owned(DEFAULT_CURRENCIES), |v| split_list(&v, true)),
            analytics: AnalyticsIds {
                ga_measurement_id: optional("GA_MEASUREMENT_ID"),
                gtm_id: optional("GTM_ID"),
                meta_pixel_id: optional("META_PIXEL_ID"),
            },
            cors_allow_origin: optional("CORS_ALLOW_ORIGIN").unwrap_or_else(|| "*".to_string()),
            redirect_rules_json: optional("REDIRECT_RULES"),
        })
    }

    /// Config with the given upstream base URLs and defaults for everything else.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any of the URLs does not parse.
    pub fn with_endpoints(crm: &str, cms: &str, site: &str) -> Result<Self, RelayError> {
        Ok(Self {
            crm_base_url: base_url(crm)?,
            crm_api_key: String::new(),
            crm_origin_id: None,
            crm_labels: BTreeMap::new(),
            cms_base_url: base_url(cms)?,
            cms_api_token: None,
            site_url: base_url(site)?,
            languages: owned(DEFAULT_LANGUAGES),
            currencies: owned(DEFAULT_CURRENCIES),
            analytics: AnalyticsIds::default(),
            cors_allow_origin: "*".to_string(),
            redirect_rules_json: None,
        })
    }

    #[must_use]
    pub fn default_language(&self) -> &str {
        self.languages.first().map_or("es", String::as_str)
    }

    /// Label for a lead source, falling back to the `default` entry.
    #[must_use]
    pub fn label_for(&self, source: &str) -> Option<u64> {
        self.crm_labels
            .get(source)
            .or_else(|| self.crm_labels.get("default"))
            .copied()
    }
}

fn required(name: &str) -> Result<String, RelayError> {
    optional(name).ok_or_else(|| RelayError::ConfigError(format!("{name} is not set")))
}

fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

fn split_list(raw: &str, upper: bool) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            if upper {
                v.to_ascii_uppercase()
            } else {
                v.to_ascii_lowercase()
            }
        })
        .collect()
}

/// Parses a base URL and makes sure it ends with `/` so that `Url::join`
/// appends instead of replacing the last path segment.
///
/// # Errors
///
/// Returns `ConfigError` if the value is not an absolute URL.
pub fn base_url(raw: &str) -> Result<Url, RelayError> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Ok(Url::parse(&normalized)?)
}

/// Parses `contact=12,property=13` into a source -> label map.
///
/// # Errors
///
/// Returns `ConfigError` for entries without `=` or with a non-numeric id.
pub fn parse_label_map(raw: &str) -> Result<BTreeMap<String, u64>, RelayError> {
    let mut labels = BTreeMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (source, id) = entry
            .split_once('=')
            .ok_or_else(|| RelayError::ConfigError(format!("CRM_LABELS entry '{entry}'")))?;
        let id = id
            .trim()
            .parse::<u64>()
            .map_err(|e| RelayError::ConfigError(format!("CRM_LABELS entry '{entry}': {e}")))?;
        labels.insert(source.trim().to_ascii_lowercase(), id);
    }
    Ok(labels)
}
