use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidDate,
    ProvisionFailed,
    InvalidConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{code:?}: {message}")]
pub struct PluvioError {
    pub code: ErrorCode,
    pub message: String,
    pub detail: Option<String>,
}

impl PluvioError {
    pub fn invalid_date(input: &str, detail: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InvalidDate,
            message: format!("malformed date string '{input}'"),
            detail: Some(detail.into()),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InvalidConfig,
            message: message.into(),
            detail: None,
        }
    }
}
