use std::error::Error;
use realty::errors::RelayError;

#[test]
fn test_relay_error_implements_error_trait() {
    fn assert_error<T: Error>(_: &T) {}

    let error = RelayError::ParseError("test error".to_string());
    assert_error(&error);
}

#[test]
fn test_relay_error_display() {
    let error = RelayError::MissingField("email".to_string());
    assert_eq!(format!("{error}"), "Missing required field: email");

    let error = RelayError::Upstream {
        status: 503,
        message: "Service Unavailable".to_string(),
    };
    assert_eq!(
        format!("{error}"),
        "Upstream returned HTTP 503: Service Unavailable"
    );

    let error = RelayError::HttpError("Connection error".to_string());
    assert_eq!(
        format!("{error}"),
        "Failed to send HTTP request: Connection error"
    );
}

#[test]
fn test_status_code_mapping() {
    assert_eq!(RelayError::MissingField("name".into()).status_code(), 400);
    assert_eq!(RelayError::InvalidInput("id".into()).status_code(), 400);
    assert_eq!(RelayError::NotFound("popup 3".into()).status_code(), 404);
    assert_eq!(RelayError::ConfigError("CRM_API_KEY".into()).status_code(), 500);
    assert_eq!(RelayError::HttpError("timeout".into()).status_code(), 500);

    let upstream = |status| RelayError::Upstream {
        status,
        message: String::new(),
    };
    assert_eq!(upstream(401).status_code(), 401);
    assert_eq!(upstream(403).status_code(), 403);
    assert_eq!(upstream(404).status_code(), 404);
    assert_eq!(upstream(422).status_code(), 400);
    assert_eq!(upstream(500).status_code(), 500);
    assert_eq!(upstream(502).status_code(), 500);
}

#[test]
fn test_public_message_hides_internal_details() {
    let error = RelayError::Upstream {
        status: 500,
        message: "stack trace from the CRM".to_string(),
    };
    assert_eq!(error.public_message(), "Internal server error");

    let error = RelayError::ConfigError("CRM_API_KEY is not set".to_string());
    assert_eq!(error.public_message(), "Internal server error");

    let error = RelayError::MissingField("email".to_string());
    assert_eq!(error.public_message(), "Missing required field: email");

    let error = RelayError::Upstream {
        status: 401,
        message: "bad key abc123".to_string(),
    };
    assert!(!error.public_message().contains("abc123"));
}

#[test]
fn test_relay_error_from_conversions() {
    // Test conversion from anyhow::Error
    let err = anyhow::anyhow!("test error");
    let relay_err: RelayError = err.into();

    match relay_err {
        RelayError::Internal(msg) => assert!(msg.contains("test error")),
        _ => panic!("Unexpected error type"),
    }

    let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let relay_err: RelayError = json_err.into();
    assert!(matches!(relay_err, RelayError::ParseError(_)));

    let url_err = url::Url::parse("not a url").unwrap_err();
    let relay_err: RelayError = url_err.into();
    assert!(matches!(relay_err, RelayError::ConfigError(_)));
}
