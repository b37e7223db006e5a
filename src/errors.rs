use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream returned HTTP {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Failed to send HTTP request: {0}")]
    HttpError(String),

    #[error("Failed to parse upstream response: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// HTTP status returned to the caller for this error.
    ///
    /// Upstream auth and lookup failures keep their status so the browser can
    /// tell them apart; any other upstream client error becomes a 400 and
    /// everything else a 500.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingField(_) | Self::InvalidInput(_) => 400,
            Self::NotFound(_) => 404,
            Self::Upstream { status, .. } => match *status {
                401 | 403 | 404 => *status,
                400..=499 => 400,
                _ => 500,
            },
            Self::HttpError(_) | Self::ParseError(_) | Self::ConfigError(_) | Self::Internal(_) => {
                500
            }
        }
    }

    /// Message safe to show to the end user.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self.status_code() {
            500 => "Internal server error".to_string(),
            401 => "Upstream service rejected the credentials".to_string(),
            403 => "Upstream service denied access".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(error: reqwest::Error) -> Self {
        match error.status() {
            Some(status) => Self::Upstream {
                status: status.as_u16(),
                message: error.to_string(),
            },
            None if error.is_decode() => Self::ParseError(error.to_string()),
            None => Self::HttpError(error.to_string()),
        }
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(error: serde_json::Error) -> Self {
        Self::ParseError(error.to_string())
    }
}

impl From<url::ParseError> for RelayError {
    fn from(error: url::ParseError) -> Self {
        Self::ConfigError(format!("invalid URL: {error}"))
    }
}

impl From<anyhow::Error> for RelayError {
    fn from(error: anyhow::Error) -> Self {
        Self::Internal(error.to_string())
    }
}
