//! Common types for the PingFederate admin API

use serde::Deserialize;
use std::fmt;

/// Error body returned by the admin API on 4xx responses
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub result_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub validation_errors: Vec<ValidationError>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    #[serde(default)]
    pub error_id: String,
    #[serde(default)]
    pub field_path: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field_path {
            Some(field) => write!(f, "{}: {} ({})", field, self.message, self.error_id),
            None => write!(f, "{} ({})", self.message, self.error_id),
        }
    }
}

/// Response from GET /version
#[derive(Debug, Clone, Deserialize)]
pub struct VersionInfo {
    pub version: String,
}
