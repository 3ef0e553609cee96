pub mod assets;
pub mod health;
pub mod query;
pub mod spaces;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /query                         natural-language question (POST)
///
/// /assets                        list by building (GET ?building=)
/// /assets/sync                   bulk snapshot sync (POST)
/// /assets/sync/summary           reconciliation preview (POST ?full=)
/// /assets/{guid}                 asset with door detail (GET)
///
/// /spaces                        list by building (GET ?building=)
/// /spaces/sync                   bulk snapshot sync (POST)
/// /spaces/sync/summary           reconciliation preview (POST ?full=)
/// /spaces/{guid}                 single space (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(query::router())
        .nest("/assets", assets::router())
        .nest("/spaces", spaces::router())
}
