//! Handlers for the `/spaces` resource.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use patrimoni_core::error::CoreError;
use patrimoni_core::sync::{ReconciliationSummary, SpaceRecord};
use patrimoni_db::models::space::Space;
use patrimoni_db::repositories::SpaceRepo;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::handlers::sync::{self, SyncResponse};
use crate::handlers::{json_body, BuildingParams, SummaryParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/spaces/sync
///
/// Preview-then-commit by default: pending deletions are returned with
/// `status: "pending_confirmation"` until the caller resends with
/// `confirmDelete: true`.
pub async fn sync(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<DataResponse<SyncResponse>>> {
    let response = sync::run::<SpaceRecord>(&state, json_body(body)?).await?;
    Ok(Json(DataResponse { data: response }))
}

/// POST /api/v1/spaces/sync/summary
pub async fn summary(
    State(state): State<AppState>,
    Query(params): Query<SummaryParams>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<DataResponse<ReconciliationSummary>>> {
    let summary = sync::preview::<SpaceRecord>(&state, json_body(body)?, params.full).await?;
    Ok(Json(DataResponse { data: summary }))
}

/// GET /api/v1/spaces?building=XXX
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<BuildingParams>,
) -> AppResult<Json<DataResponse<Vec<Space>>>> {
    let spaces = SpaceRepo::list_by_building(&state.pool, params.require()?).await?;
    Ok(Json(DataResponse { data: spaces }))
}

/// GET /api/v1/spaces/{guid}
pub async fn get_by_guid(
    State(state): State<AppState>,
    Path(guid): Path<String>,
) -> AppResult<Json<DataResponse<Space>>> {
    let space = SpaceRepo::find_by_guid(&state.pool, &guid)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Space",
            key: guid,
        }))?;
    Ok(Json(DataResponse { data: space }))
}
