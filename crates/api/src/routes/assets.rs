use axum::routing::{get, post};
use axum::Router;

use crate::handlers::assets;
use crate::state::AppState;

/// Asset routes mounted at `/assets`.
///
/// ```text
/// GET  /               -> list (?building=)
/// POST /sync           -> sync
/// POST /sync/summary   -> summary (?full=)
/// GET  /{guid}         -> get_by_guid
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(assets::list))
        .route("/sync", post(assets::sync))
        .route("/sync/summary", post(assets::summary))
        .route("/{guid}", get(assets::get_by_guid))
}
