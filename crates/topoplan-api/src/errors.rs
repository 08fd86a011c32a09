use thiserror::Error;
use topoplan_utils::ResourceKind;

/// API-specific errors for topoplan-api
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("Plan error: {0}")]
    Plan(#[from] topoplan_core::PlanError),

    #[error("Utils error: {0}")]
    Utils(#[from] topoplan_utils::UtilsError),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Backend rejected {kind} '{logical_id}': {reason}")]
    Rejected {
        kind: ResourceKind,
        logical_id: String,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    pub fn rejected(
        kind: ResourceKind,
        logical_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ApiError::Rejected {
            kind,
            logical_id: logical_id.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Resource conflict: {0}")]
    Conflict(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Service unavailable")]
    ServiceUnavailable,

    #[error("Request timeout")]
    Timeout,

    #[error("HTTP error {status}: {message}")]
    HttpError { status: u16, message: String },

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;
