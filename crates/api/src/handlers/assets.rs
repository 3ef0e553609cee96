//! Handlers for the `/assets` resource.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use patrimoni_core::error::CoreError;
use patrimoni_core::sync::{AssetRecord, ReconciliationSummary};
use patrimoni_db::models::asset::{Asset, AssetDetail};
use patrimoni_db::repositories::AssetRepo;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::handlers::sync::{self, SyncResponse};
use crate::handlers::{json_body, BuildingParams, SummaryParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/assets/sync
///
/// Upserts every asset with its door rows, then removes the building's
/// assets missing from the snapshot (auto-commit unless `mode` says otherwise).
pub async fn sync(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<DataResponse<SyncResponse>>> {
    let response = sync::run::<AssetRecord>(&state, json_body(body)?).await?;
    Ok(Json(DataResponse { data: response }))
}

/// POST /api/v1/assets/sync/summary
pub async fn summary(
    State(state): State<AppState>,
    Query(params): Query<SummaryParams>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<DataResponse<ReconciliationSummary>>> {
    let summary = sync::preview::<AssetRecord>(&state, json_body(body)?, params.full).await?;
    Ok(Json(DataResponse { data: summary }))
}

/// GET /api/v1/assets?building=XXX
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<BuildingParams>,
) -> AppResult<Json<DataResponse<Vec<Asset>>>> {
    let assets = AssetRepo::list_by_building(&state.pool, params.require()?).await?;
    Ok(Json(DataResponse { data: assets }))
}

/// GET /api/v1/assets/{guid}
pub async fn get_by_guid(
    State(state): State<AppState>,
    Path(guid): Path<String>,
) -> AppResult<Json<DataResponse<AssetDetail>>> {
    let detail = AssetRepo::find_detail(&state.pool, &guid)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Asset",
            key: guid,
        }))?;
    Ok(Json(DataResponse { data: detail }))
}
