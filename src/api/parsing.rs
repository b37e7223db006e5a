//! Extraction of method, path, query and body from a gateway event.

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use crate::errors::RelayError;
use crate::utils::json::v_str;

/// The parts of a gateway event the router needs.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub raw_query: Option<String>,
    pub query: HashMap<String, String>,
    pub body: Option<String>,
}

impl Request {
    /// # Errors
    ///
    /// `InvalidInput` if a base64 body does not decode to UTF-8 text.
    pub fn from_event(payload: &Value) -> Result<Self, RelayError> {
        let method = v_str(payload, &["requestContext", "http", "method"])
            .or_else(|| v_str(payload, &["httpMethod"]))
            .unwrap_or("GET")
            .to_ascii_uppercase();
        let path = v_str(payload, &["rawPath"])
            .or_else(|| v_str(payload, &["path"]))
            .unwrap_or("/")
            .to_string();
        let raw_query = v_str(payload, &["rawQueryString"]).map(str::to_string);
        let query = match payload.get("queryStringParameters").and_then(Value::as_object) {
            Some(map) if raw_query.is_none() => map
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect(),
            _ => parse_query_string(raw_query.as_deref().unwrap_or("")),
        };

        Ok(Self {
            method,
            path,
            raw_query,
            query,
            body: extract_body(payload)?,
        })
    }

    /// Query parameter, blank values treated as absent.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Body parsed as JSON.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when the body is missing or not valid JSON.
    pub fn json_body(&self) -> Result<Value, RelayError> {
        let body = self
            .body
            .as_deref()
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| RelayError::InvalidInput("Missing body".to_string()))?;
        serde_json::from_str(body)
            .map_err(|e| RelayError::InvalidInput(format!("body is not valid JSON: {e}")))
    }
}

fn extract_body(payload: &Value) -> Result<Option<String>, RelayError> {
    let Some(body) = payload.get("body").and_then(Value::as_str) else {
        return Ok(None);
    };

    let encoded = payload
        .get("isBase64Encoded")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !encoded {
        return Ok(Some(body.to_string()));
    }

    let bytes = STANDARD
        .decode(body)
        .map_err(|e| RelayError::InvalidInput(format!("Failed to decode body: {e}")))?;
    String::from_utf8(bytes)
        .map(Some)
        .map_err(|e| RelayError::InvalidInput(format!("Body is not UTF-8: {e}")))
}

/// Decode `a=1&b=x+y` into a map. Later duplicates win.
#[must_use]
pub fn parse_query_string(raw: &str) -> HashMap<String, String> {
    raw.trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = decode_url_component(key)?;
            let value = decode_url_component(value)?;
            Some((key, value))
        })
        .collect()
}

#[must_use]
pub fn decode_url_component(raw: &str) -> Option<String> {
    urlencoding::decode(&raw.replace('+', " "))
        .ok()
        .map(std::borrow::Cow::into_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_http_api_v2_event() {
        let event = json!({
            "rawPath": "/api/properties",
            "rawQueryString": "type=piso&zone=Centro+Hist%C3%B3rico&page=2",
            "requestContext": {"http": {"method": "get"}},
            "headers": {"content-type": "application/json"}
        });
        let req = Request::from_event(&event).unwrap();
        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/api/properties");
        assert_eq!(req.param("zone"), Some("Centro Histórico"));
        assert_eq!(req.param("page"), Some("2"));
        assert!(req.body.is_none());
    }

    #[test]
    fn reads_rest_v1_event_with_base64_body() {
        let event = json!({
            "httpMethod": "POST",
            "path": "/api/leads",
            "queryStringParameters": {"lang": "en"},
            "isBase64Encoded": true,
            "body": STANDARD.encode(r#"{"email":"a@b.c"}"#)
        });
        let req = Request::from_event(&event).unwrap();
        assert_eq!(req.method, "POST");
        assert_eq!(req.param("lang"), Some("en"));
        assert_eq!(req.json_body().unwrap()["email"], "a@b.c");
    }

    #[test]
    fn bad_base64_is_invalid_input() {
        let event = json!({"isBase64Encoded": true, "body": "%%%"});
        assert!(matches!(
            Request::from_event(&event),
            Err(RelayError::InvalidInput(_))
        ));
    }

    #[test]
    fn missing_body_is_invalid_input() {
        let req = Request::from_event(&json!({"rawPath": "/api/leads"})).unwrap();
        let err = req.json_body().unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn query_string_edge_cases() {
        let q = parse_query_string("?a=1&flag&b=&a=2");
        assert_eq!(q.get("a").map(String::as_str), Some("2"));
        assert_eq!(q.get("flag").map(String::as_str), Some(""));
        assert_eq!(q.get("b").map(String::as_str), Some(""));
    }
}
