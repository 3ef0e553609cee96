//! Request handlers.
//!
//! Handlers delegate persistence to the repositories in `patrimoni_db` and
//! map failures via [`AppError`](crate::error::AppError).

pub mod assets;
pub mod query;
pub mod spaces;
pub mod sync;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde::Deserialize;

use crate::error::AppError;

/// `?building=XXX` on the list endpoints.
#[derive(Debug, Deserialize)]
pub struct BuildingParams {
    pub building: Option<String>,
}

impl BuildingParams {
    /// The trimmed building code, or a 400 when missing.
    pub fn require(&self) -> Result<&str, AppError> {
        self.building
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .ok_or_else(|| AppError::BadRequest("query parameter 'building' is required".into()))
    }
}

/// `?full=true` on the summary endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct SummaryParams {
    #[serde(default)]
    pub full: bool,
}

/// Unwrap a JSON body, turning axum's rejection into a `BAD_REQUEST` body.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}
