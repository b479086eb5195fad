use http::StatusCode;
use thiserror::Error;

use crate::error::CredentialError;

#[derive(Debug, Error)]
pub enum WeatherError {
    /// No usable credential, so no request was sent.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("weather API returned HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// HTTP 200 with a non-"200" `code` field in the body.
    #[error("weather API returned code {0}")]
    Api(String),

    #[error("weather API request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl WeatherError {
    pub fn is_retryable(&self) -> bool {
        match self {
            WeatherError::Transport(e) => !e.is_decode(),
            WeatherError::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            WeatherError::Credential(e) => e.reason(),
            WeatherError::InvalidRequest(_) => "invalid_request",
            WeatherError::Status { .. } => "status",
            WeatherError::Api(_) => "api",
            WeatherError::Transport(_) => "transport",
        }
    }
}
