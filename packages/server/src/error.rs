use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;

use crate::store::StoreError;

/// Per-field validation messages, keyed by form field name.
pub type FieldErrors = BTreeMap<&'static str, String>;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `PERMISSION_DENIED`, `NOT_FOUND`,
    /// `CONFLICT`, `PAYLOAD_TOO_LARGE`, `STORAGE_UNAVAILABLE`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "The given data was invalid")]
    pub message: String,
    /// Field-level messages for form validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub fields: Option<FieldErrors>,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    /// Validation failed on one or more form fields.
    InvalidFields(FieldErrors),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    PermissionDenied,
    NotFound(String),
    Conflict(String),
    PayloadTooLarge,
    /// Module storage directory could not be provisioned. Carries the
    /// detail for the log; the client only sees a generic message.
    StorageUnavailable(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => simple(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            AppError::InvalidFields(fields) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: "The given data was invalid".into(),
                    fields: Some(fields),
                },
            ),
            AppError::TokenMissing => simple(
                StatusCode::UNAUTHORIZED,
                "TOKEN_MISSING",
                "Authentication required".into(),
            ),
            AppError::TokenInvalid => simple(
                StatusCode::UNAUTHORIZED,
                "TOKEN_INVALID",
                "Invalid or expired token".into(),
            ),
            AppError::InvalidCredentials => simple(
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "The provided credentials do not match our records".into(),
            ),
            AppError::PermissionDenied => simple(
                StatusCode::FORBIDDEN,
                "PERMISSION_DENIED",
                "This action is unauthorized".into(),
            ),
            AppError::NotFound(msg) => simple(StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            AppError::Conflict(msg) => simple(StatusCode::CONFLICT, "CONFLICT", msg),
            AppError::PayloadTooLarge => simple(
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                "The request body is too large".into(),
            ),
            AppError::StorageUnavailable(detail) => {
                tracing::error!("Storage provisioning failed: {}", detail);
                simple(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_UNAVAILABLE",
                    "The file could not be stored. Please try again later".into(),
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                simple(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An unexpected error occurred".into(),
                )
            }
        }
    }
}

fn simple(status: StatusCode, code: &'static str, message: String) -> (StatusCode, ErrorBody) {
    (
        status,
        ErrorBody {
            code,
            message,
            fields: None,
        },
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                tracing::debug!("Unique constraint caught on write: {detail}");
                AppError::Conflict("A record with the same unique value already exists".into())
            }
            _ => AppError::Internal(err.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MissingName => AppError::InvalidFields(FieldErrors::from([(
                "name",
                "The name field is required".to_string(),
            )])),
            StoreError::NotFound(_) => AppError::NotFound("Company not found".into()),
            err @ StoreError::StorageProvisioning { .. } => {
                AppError::StorageUnavailable(err.to_string())
            }
            StoreError::Storage(e) => AppError::Internal(e.to_string()),
            StoreError::Db(e) => AppError::from(e),
        }
    }
}
