use thiserror::Error;

use super::common::ValidationError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Resource not found at {0}")]
    NotFound(String),

    #[error("API returned error (HTTP {status}): {message}")]
    ApiError {
        status: u16,
        message: String,
        validation_errors: Vec<ValidationError>,
    },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Authentication failed")]
    AuthError,

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Too many requests, rate limited")]
    RateLimited,

    #[error("Service unavailable, retry later")]
    ServiceUnavailable,

    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    #[error("Request cancelled")]
    Cancelled,
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }

    /// Error text for a diagnostic, including any field validation errors
    pub fn detail(&self) -> String {
        match self {
            ApiError::ApiError {
                validation_errors, ..
            } if !validation_errors.is_empty() => {
                let mut detail = self.to_string();
                for err in validation_errors {
                    detail.push_str("\n  ");
                    detail.push_str(&err.to_string());
                }
                detail
            }
            _ => self.to_string(),
        }
    }
}
