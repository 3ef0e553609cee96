use axum::routing::{get, post};
use axum::Router;

use crate::handlers::spaces;
use crate::state::AppState;

/// Space routes mounted at `/spaces`.
///
/// ```text
/// GET  /               -> list (?building=)
/// POST /sync           -> sync
/// POST /sync/summary   -> summary (?full=)
/// GET  /{guid}         -> get_by_guid
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(spaces::list))
        .route("/sync", post(spaces::sync))
        .route("/sync/summary", post(spaces::summary))
        .route("/{guid}", get(spaces::get_by_guid))
}
