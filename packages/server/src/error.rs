use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::hook::HookError;
use serde::Serialize;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "This file is not in the protected_uploads directory and may not be protected.")]
    pub message: String,
    /// Per-row validation messages, keyed by row index, when a save is rejected.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldErrorBody>,
}

/// A single rejected field value.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct FieldErrorBody {
    /// Zero-based row index.
    pub row: usize,
    /// Field name within the row.
    #[schema(example = "file")]
    pub field: String,
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    /// One or more rows failed save-time validation.
    InvalidFields(Vec<FieldErrorBody>),
    TokenMissing,
    TokenInvalid,
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation(_) | AppError::InvalidFields(_) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            }
            AppError::TokenMissing => (StatusCode::UNAUTHORIZED, "TOKEN_MISSING"),
            AppError::TokenInvalid => (StatusCode::UNAUTHORIZED, "TOKEN_INVALID"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let (message, errors) = match self {
            AppError::Validation(msg) => (msg, Vec::new()),
            AppError::InvalidFields(errors) => {
                // A single failure is shown as-is; several are summarised.
                let message = match errors.as_slice() {
                    [single] => single.message.clone(),
                    _ => format!("{} fields failed validation", errors.len()),
                };
                (message, errors)
            }
            AppError::TokenMissing => ("Authentication required".into(), Vec::new()),
            AppError::TokenInvalid => ("Invalid token".into(), Vec::new()),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ("An unexpected error occurred".into(), Vec::new())
            }
        };

        (
            status,
            Json(ErrorBody {
                code,
                message,
                errors,
            }),
        )
            .into_response()
    }
}

impl From<HookError> for AppError {
    fn from(err: HookError) -> Self {
        match err {
            HookError::Rejected { reason, .. } => AppError::Validation(reason),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
