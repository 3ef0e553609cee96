use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use patrimoni_core::completion::CompletionError;
use patrimoni_core::error::CoreError;
use patrimoni_core::sql_guard::SqlRejection;
use serde_json::{json, Map, Value};

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `patrimoni_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The completion service failed or timed out.
    #[error(transparent)]
    Completion(#[from] CompletionError),

    /// A generated statement failed the read-only policy.
    #[error("Generated SQL rejected: {reason}")]
    SqlRejected { sql: String, reason: SqlRejection },

    /// A validated statement failed while executing.
    #[error("Query failed: {message}")]
    QueryFailed { sql: String, message: String },

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut details = Map::new();

        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, key } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with key {key} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- Query bridge ---
            AppError::Completion(err) => {
                tracing::error!(error = %err, "Completion service failure");
                match err {
                    CompletionError::Timeout { .. } => {
                        (StatusCode::GATEWAY_TIMEOUT, "COMPLETION_TIMEOUT", err.to_string())
                    }
                    _ => (StatusCode::BAD_GATEWAY, "COMPLETION_FAILED", err.to_string()),
                }
            }
            AppError::SqlRejected { sql, reason } => {
                details.insert("sql".into(), json!(sql));
                details.insert("reason".into(), json!(reason.reason_code()));
                (StatusCode::BAD_REQUEST, "SQL_REJECTED", reason.to_string())
            }
            AppError::QueryFailed { sql, message } => {
                details.insert("sql".into(), json!(sql));
                details.insert("detail".into(), json!(message));
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "QUERY_FAILED",
                    "The generated query could not be executed".to_string(),
                )
            }

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let mut body = Map::new();
        body.insert("error".into(), Value::String(message));
        body.insert("code".into(), Value::String(code.to_string()));
        body.extend(details);

        (status, axum::Json(Value::Object(body))).into_response()
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                return (
                    StatusCode::CONFLICT,
                    "CONFLICT",
                    format!("Duplicate value violates unique constraint: {constraint}"),
                );
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}
