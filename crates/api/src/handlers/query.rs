//! Handler for the natural-language query bridge.

use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use patrimoni_core::error::CoreError;
use patrimoni_core::prompt::{compose_prompt, extract_sql, QuestionRequest};
use patrimoni_db::repositories::{QueryError, RegistryQueryRepo};
use serde::Serialize;
use serde_json::Value;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::json_body;
use crate::response::DataResponse;
use crate::state::AppState;

/// Answer to a question: the statement that ran and its rows.
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub sql: String,
    pub normalized_question: String,
    pub columns: Vec<String>,
    pub rows: Vec<Value>,
    pub row_count: usize,
}

/// POST /api/v1/query
///
/// normalize -> compose prompt -> completion -> validate SQL -> execute
/// read-only. Each stage's failure maps to its own error code.
pub async fn ask(
    State(state): State<AppState>,
    body: Result<Json<QuestionRequest>, JsonRejection>,
) -> AppResult<Json<DataResponse<QueryResponse>>> {
    let input = json_body(body)?;
    input
        .validate()
        .map_err(|e| CoreError::Validation(e.to_string()))?;

    let normalized_question = state.normalizer.normalize(input.question.trim());
    let prompt = compose_prompt(&normalized_question, input.building.as_deref());
    tracing::debug!(question = %normalized_question, "Requesting SQL completion");

    let completion = state.completion.complete(&prompt).await?;
    let sql = extract_sql(&completion);

    let validated = state.sql_policy.validate(&sql).map_err(|reason| {
        tracing::warn!(%sql, reason = reason.reason_code(), "Rejected generated SQL");
        AppError::SqlRejected {
            sql: sql.clone(),
            reason,
        }
    })?;

    let timeout = Duration::from_secs(state.config.query_timeout_secs);
    let result = RegistryQueryRepo::fetch_read_only(&state.pool, &validated, timeout)
        .await
        .map_err(|e| match e {
            QueryError::Setup(e) => AppError::Database(e),
            QueryError::Statement(e) => {
                tracing::warn!(sql = %validated, error = %e, "Generated query failed");
                AppError::QueryFailed {
                    sql: validated.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

    tracing::info!(
        sql = %validated,
        row_count = result.rows.len(),
        "Answered registry question",
    );

    Ok(Json(DataResponse {
        data: QueryResponse {
            row_count: result.rows.len(),
            sql: validated.into_inner(),
            normalized_question,
            columns: result.columns,
            rows: result.rows,
        },
    }))
}
