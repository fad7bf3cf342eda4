//! Normalized API responses

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Basecamp returned HTTP {code}: {message}")]
    Status { code: u16, message: String },

    #[error("Could not determine Basecamp account id")]
    NoAccount,

    #[error("Unexpected response shape: {0}")]
    Shape(String),
}

/// Result of a single HTTP exchange.
///
/// `code` is 0 and `error` is set when no response was received at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub code: u16,
    pub data: Value,
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiResponse {
    pub fn new(code: u16, data: Value) -> Self {
        Self {
            code,
            data,
            headers: BTreeMap::new(),
            error: false,
            message: None,
        }
    }

    /// A request that never produced an HTTP response
    pub fn transport_failure(message: impl Into<String>) -> Self {
        Self {
            code: 0,
            data: Value::Object(Map::new()),
            headers: BTreeMap::new(),
            error: true,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        !self.error && (200..300).contains(&self.code)
    }

    /// Human-readable reason for a failed exchange
    pub fn failure_message(&self) -> String {
        if let Some(message) = &self.message {
            return message.clone();
        }
        self.data
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| "Unknown error".to_string())
    }

    pub fn into_result(self) -> Result<Value, ApiError> {
        if self.error {
            return Err(ApiError::Transport(self.failure_message()));
        }
        if !self.is_success() {
            return Err(ApiError::Status {
                code: self.code,
                message: self.failure_message(),
            });
        }
        Ok(self.data)
    }
}

impl From<ApiError> for ApiResponse {
    fn from(err: ApiError) -> Self {
        ApiResponse::transport_failure(err.to_string())
    }
}
