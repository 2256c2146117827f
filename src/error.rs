// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use std::fmt;

/// One offending field with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failure modes of one composite save operation.
///
/// Validation and unresolved-reference errors are user-correctable and carry
/// the offending field; storage errors are internal and only logged in full.
#[derive(Debug)]
pub enum SaveError {
    /// The payload failed kind-specific shape rules. No writes were attempted.
    Validation(Vec<FieldError>),
    /// A child referenced a temporary identifier never registered in this
    /// operation.
    UnresolvedReference { field: String, reference: String },
    /// The target question does not exist.
    NotFound(String),
    /// The submitted state disagrees with the persisted state (e.g. a reorder
    /// that does not list every question of the set exactly once).
    Conflict(String),
    /// The storage collaborator failed; the surrounding transaction must be
    /// rolled back.
    Storage(String),
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::Validation(errors) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                write!(f, "validation failed for: {}", fields.join(", "))
            }
            SaveError::UnresolvedReference { field, reference } => {
                write!(f, "{field}: '{reference}' is referenced but never assigned")
            }
            SaveError::NotFound(msg) => write!(f, "{msg}"),
            SaveError::Conflict(msg) => write!(f, "{msg}"),
            SaveError::Storage(msg) => write!(f, "storage failure: {msg}"),
        }
    }
}

impl std::error::Error for SaveError {}

impl SaveError {
    /// Shorthand for a single-field validation failure.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        SaveError::Validation(vec![FieldError::new(field, message)])
    }
}

impl From<sqlx::Error> for SaveError {
    fn from(err: sqlx::Error) -> Self {
        SaveError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for SaveError {
    fn from(err: serde_json::Error) -> Self {
        SaveError::Storage(err.to_string())
    }
}

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request, free-form message
    BadRequest(String),

    // 400 Bad Request, structured (field, message) pairs
    Validation(Vec<FieldError>),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                let body = Json(json!({ "error": "Internal Server Error" }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
            AppError::Validation(errors) => {
                let body = Json(json!({ "errors": errors }));
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": msg }))).into_response()
            }
            AppError::Conflict(msg) => {
                (StatusCode::CONFLICT, Json(json!({ "error": msg }))).into_response()
            }
        }
    }
}

impl From<SaveError> for AppError {
    fn from(err: SaveError) -> Self {
        match err {
            SaveError::Validation(errors) => AppError::Validation(errors),
            SaveError::UnresolvedReference { field, reference } => {
                AppError::Validation(vec![FieldError::new(
                    field,
                    format!("'{reference}' is referenced but never assigned"),
                )])
            }
            SaveError::NotFound(msg) => AppError::NotFound(msg),
            SaveError::Conflict(msg) => AppError::Conflict(msg),
            SaveError::Storage(msg) => AppError::InternalServerError(msg),
        }
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
