//! Shared flow of the `/sync` and `/sync/summary` endpoints.

use patrimoni_core::sync::{AppliedChanges, ReconciliationSummary, SyncRequest};
use patrimoni_db::repositories::{SyncRepo, SyncTarget};
use serde::Serialize;
use serde_json::Value;

use crate::error::AppResult;
use crate::state::AppState;

/// Body of a sync response.
#[derive(Debug, Serialize)]
pub struct SyncResponse {
    /// `committed`, `pending_confirmation` or `aborted`.
    pub status: &'static str,
    pub mode: &'static str,
    pub summary: ReconciliationSummary,
    /// Row counts written, present only once committed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied: Option<AppliedChanges>,
    /// Every key that would be deleted, listed while awaiting confirmation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proposed_deletions: Option<Vec<String>>,
}

pub(crate) async fn run<T: SyncTarget>(state: &AppState, body: Value) -> AppResult<SyncResponse> {
    let request = SyncRequest::<T>::from_json(body)?;
    let outcome = SyncRepo::sync(&state.pool, request).await?;

    let proposed_deletions = outcome.applied.is_none().then(|| {
        outcome
            .reconciliation
            .deleted_keys()
            .map(str::to_owned)
            .collect::<Vec<_>>()
    });

    Ok(SyncResponse {
        status: outcome.decision.status(),
        mode: outcome.mode.as_str(),
        summary: outcome.reconciliation.summary(false),
        applied: outcome.applied,
        proposed_deletions,
    })
}

pub(crate) async fn preview<T: SyncTarget>(
    state: &AppState,
    body: Value,
    full: bool,
) -> AppResult<ReconciliationSummary> {
    let request = SyncRequest::<T>::from_json(body)?;
    let reconciliation = SyncRepo::preview(&state.pool, request).await?;
    Ok(reconciliation.summary(full))
}
