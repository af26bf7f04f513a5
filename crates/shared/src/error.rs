use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ParseColorError, ParseUndertoneError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    InvalidArgument,
    Conflict,
    PayloadTooLarge,
    Internal,
}

/// Error body returned by every JSON endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{code:?}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }
}

impl From<ParseColorError> for ApiError {
    fn from(value: ParseColorError) -> Self {
        Self::validation(value.to_string())
    }
}

impl From<ParseUndertoneError> for ApiError {
    fn from(value: ParseUndertoneError) -> Self {
        Self::validation(value.to_string())
    }
}
