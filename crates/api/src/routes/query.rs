use axum::routing::post;
use axum::Router;

use crate::handlers::query;
use crate::state::AppState;

/// Natural-language query route.
///
/// ```text
/// POST /query  -> ask
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/query", post(query::ask))
}
