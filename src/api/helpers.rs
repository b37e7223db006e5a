//! Common helper functions for API handlers.
//!
//! Responses are gateway objects: `{statusCode, headers, body}` with the
//! body already serialized.

use serde::Serialize;
use serde_json::{Value, json};
use tracing::error;

// ============================================================================
// Response Builders
// ============================================================================

/// Returns a JSON response with the given status code.
#[must_use]
pub fn json_response<T: Serialize>(status_code: u16, body: &T) -> Value {
    match serde_json::to_string(body) {
        Ok(body) => json!({
            "statusCode": status_code,
            "headers": { "Content-Type": "application/json; charset=utf-8" },
            "body": body
        }),
        Err(e) => {
            error!("Failed to serialize response body: {}", e);
            err_response(500, "Internal server error")
        }
    }
}

/// Returns a 200 OK JSON response.
#[must_use]
pub fn ok_json<T: Serialize>(body: &T) -> Value {
    json_response(200, body)
}

/// Returns an error response with the given status code and message.
#[must_use]
pub fn err_response(status_code: u16, message: &str) -> Value {
    json!({
        "statusCode": status_code,
        "headers": { "Content-Type": "application/json; charset=utf-8" },
        "body": json!({ "error": message }).to_string()
    })
}

/// Returns a non-JSON response (XML, plain text).
#[must_use]
pub fn text_response(status_code: u16, content_type: &str, body: String) -> Value {
    json!({
        "statusCode": status_code,
        "headers": { "Content-Type": content_type },
        "body": body
    })
}

/// Returns a 301 or 302 redirect response.
#[must_use]
pub fn redirect(url: &str, permanent: bool) -> Value {
    json!({
        "statusCode": if permanent { 301 } else { 302 },
        "headers": { "Location": url },
        "body": ""
    })
}

/// Returns a 204 response, used for CORS preflight.
#[must_use]
pub fn no_content() -> Value {
    json!({ "statusCode": 204, "headers": {}, "body": "" })
}

/// Adds CORS headers to a response built by one of the helpers above.
#[must_use]
pub fn with_cors(mut response: Value, allow_origin: &str) -> Value {
    if !response.get("headers").is_some_and(Value::is_object) {
        response["headers"] = json!({});
    }
    if let Some(headers) = response.get_mut("headers").and_then(Value::as_object_mut) {
        headers.insert(
            "Access-Control-Allow-Origin".to_string(),
            Value::String(allow_origin.to_string()),
        );
        headers.insert(
            "Access-Control-Allow-Methods".to_string(),
            Value::String("GET, POST, OPTIONS".to_string()),
        );
        headers.insert(
            "Access-Control-Allow-Headers".to_string(),
            Value::String("Content-Type".to_string()),
        );
        if allow_origin != "*" {
            headers.insert("Vary".to_string(), Value::String("Origin".to_string()));
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn err_response_has_error_field() {
        let resp = err_response(400, "Missing required field: email");
        assert_eq!(resp["statusCode"], 400);
        let body: Value = serde_json::from_str(resp["body"].as_str().unwrap()).unwrap();
        assert_eq!(body["error"], "Missing required field: email");
    }

    #[test]
    fn redirect_statuses() {
        assert_eq!(redirect("/a", true)["statusCode"], 301);
        assert_eq!(redirect("/a", false)["statusCode"], 302);
        assert_eq!(redirect("/a", false)["headers"]["Location"], "/a");
    }

    #[test]
    fn cors_headers_are_merged() {
        let resp = with_cors(ok_json(&json!({"ok": true})), "https://www.site.test");
        assert_eq!(resp["headers"]["Access-Control-Allow-Origin"], "https://www.site.test");
        assert_eq!(resp["headers"]["Vary"], "Origin");
        assert_eq!(resp["headers"]["Content-Type"], "application/json; charset=utf-8");
    }
}
