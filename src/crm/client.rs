//! CRM REST client module
//!
//! Encapsulates the property-search, client and label endpoints of the CRM.
//! Calls are made once: a failed call surfaces as a `RelayError` and the
//! caller decides what to do with it.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::core::config::AppConfig;
use crate::core::models::{NewClient, Origin};
use crate::errors::RelayError;
use crate::search::normalize::unwrap_record;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Operations the relays need from the CRM.
#[async_trait]
pub trait CrmApi: Send + Sync {
    /// Raw search response for an already mapped parameter set.
    async fn search_properties(&self, params: &[(String, String)]) -> Result<Value, RelayError>;

    /// Raw listing record. Missing listings are `NotFound`.
    async fn get_property(&self, id: u64) -> Result<Value, RelayError>;

    /// Creates a client record and returns its CRM id.
    async fn create_client(&self, client: &NewClient) -> Result<u64, RelayError>;

    async fn assign_label(&self, client_id: u64, label_id: u64) -> Result<(), RelayError>;

    async fn list_origins(&self) -> Result<Vec<Origin>, RelayError>;
}

/// reqwest-backed CRM client.
#[derive(Debug, Clone)]
pub struct CrmClient {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl CrmClient {
    /// # Errors
    ///
    /// `ConfigError` if the HTTP client cannot be built.
    pub fn new(base_url: Url, api_key: String) -> Result<Self, RelayError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RelayError::ConfigError(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, RelayError> {
        Self::new(config.crm_base_url.clone(), config.crm_api_key.clone())
    }

    fn endpoint(&self, path: &str) -> Result<Url, RelayError> {
        Ok(self.base_url.join(path)?)
    }

    async fn send_json(&self, request: reqwest::RequestBuilder) -> Result<Value, RelayError> {
        let resp = request
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        read_json(resp).await
    }
}

/// Turn an upstream response into JSON, mapping non-2xx statuses to
/// `RelayError::Upstream` with the best message the body offers.
///
/// # Errors
///
/// Returns `Upstream` for non-success statuses and `ParseError` for bodies
/// that are not JSON. An empty success body is `Value::Null`.
pub async fn read_json(resp: Response) -> Result<Value, RelayError> {
    let status = resp.status();
    let url = resp.url().clone();
    let body = resp.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| {
                ["message", "error", "detail"]
                    .iter()
                    .find_map(|k| v.get(*k).and_then(Value::as_str).map(str::to_string))
            })
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
        debug!(%url, status = status.as_u16(), "Upstream error body: {}", body);
        return Err(RelayError::Upstream {
            status: status.as_u16(),
            message,
        });
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body)
        .map_err(|e| RelayError::ParseError(format!("{url}: {e}")))
}

/// Client id from a creation response: `{"id": 1}`, `{"client_id": 1}` or
/// either of them under `data`.
#[must_use]
pub fn extract_client_id(body: &Value) -> Option<u64> {
    let record = unwrap_record(body);
    ["id", "client_id", "cod_cli"].iter().find_map(|k| {
        record.get(*k).and_then(|v| match v {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        })
    })
}

#[async_trait]
impl CrmApi for CrmClient {
    async fn search_properties(&self, params: &[(String, String)]) -> Result<Value, RelayError> {
        let url = self.endpoint("properties")?;
        debug!(?params, "CRM property search");
        self.send_json(self.http.get(url).query(params)).await
    }

    async fn get_property(&self, id: u64) -> Result<Value, RelayError> {
        let url = self.endpoint(&format!("properties/{id}"))?;
        match self.send_json(self.http.get(url)).await {
            Err(RelayError::Upstream { status: 404, .. }) => {
                Err(RelayError::NotFound(format!("property {id}")))
            }
            Ok(Value::Null) => Err(RelayError::NotFound(format!("property {id}"))),
            other => other,
        }
    }

    async fn create_client(&self, client: &NewClient) -> Result<u64, RelayError> {
        let url = self.endpoint("clients")?;
        let body = self.send_json(self.http.post(url).json(client)).await?;
        let id = extract_client_id(&body).ok_or_else(|| {
            RelayError::ParseError("client creation response without id".to_string())
        })?;
        info!(client_id = id, "CRM client created");
        Ok(id)
    }

    async fn assign_label(&self, client_id: u64, label_id: u64) -> Result<(), RelayError> {
        let url = self.endpoint(&format!("clients/{client_id}/labels"))?;
        self.send_json(self.http.post(url).json(&json!({ "label_id": label_id })))
            .await?;
        Ok(())
    }

    async fn list_origins(&self) -> Result<Vec<Origin>, RelayError> {
        let url = self.endpoint("origins")?;
        let body = self.send_json(self.http.get(url)).await?;
        let items = match &body {
            Value::Array(items) => items.clone(),
            other => other
                .get("data")
                .or_else(|| other.get("items"))
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
        };
        Ok(items
            .iter()
            .filter_map(|item| {
                let id = item.get("id").and_then(Value::as_u64)?;
                let name = item
                    .get("name")
                    .or_else(|| item.get("nombre"))
                    .and_then(Value::as_str)?;
                Some(Origin {
                    id,
                    name: name.to_string(),
                })
            })
            .collect())
    }
}
