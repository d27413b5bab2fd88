use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Serialize;

use crate::validation::FieldFault;

pub type AppResult<T> = Result<T, AppError>;

/// AppError
///
/// The single error taxonomy of the service. Every fault raised by a handler,
/// the token verifier or the configuration loader is one of these variants,
/// and every variant renders the same JSON failure envelope.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Missing or malformed input. `faults` lists field-level problems when
    /// the input came from a rule-table validator.
    #[error("{message}")]
    Validation {
        message: String,
        faults: Vec<FieldFault>,
    },
    #[error("{0}")]
    NotFound(String),
    /// Token verification or credential failure.
    #[error("{0}")]
    Auth(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Configuration(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            faults: Vec::new(),
        }
    }

    pub fn invalid_fields(message: impl Into<String>, faults: Vec<FieldFault>) -> Self {
        Self::Validation {
            message: message.into(),
            faults,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code carried in the `code` field of the envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Auth(_) => "AUTH_ERROR",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// ErrorEnvelope
///
/// `{ success: false, error, code, statusCode, timestamp }` plus the field
/// faults of a validation failure, when there are any.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: String,
    pub code: &'static str,
    pub status_code: u16,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldFault>,
}

impl From<&AppError> for ErrorEnvelope {
    fn from(err: &AppError) -> Self {
        let fields = match err {
            AppError::Validation { faults, .. } => faults.clone(),
            _ => Vec::new(),
        };

        Self {
            success: false,
            error: err.to_string(),
            code: err.code(),
            status_code: err.status().as_u16(),
            timestamp: Utc::now().to_rfc3339(),
            fields,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Server-side faults are logged with their detail; the client only
        // ever sees the generic message for them.
        let envelope = match &self {
            AppError::Configuration(detail) | AppError::Internal(detail) => {
                tracing::error!(code = self.code(), "request failed: {}", detail);
                let mut envelope = ErrorEnvelope::from(&self);
                envelope.error = "Internal server error".to_string();
                envelope
            }
            _ => ErrorEnvelope::from(&self),
        };

        (status, Json(envelope)).into_response()
    }
}
