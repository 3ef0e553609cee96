use std::sync::Arc;

use patrimoni_core::completion::CompletionGateway;
use patrimoni_core::normalizer::Normalizer;
use patrimoni_core::sql_guard::SqlPolicy;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: patrimoni_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Synonym rewriting applied to every question.
    pub normalizer: Arc<Normalizer>,
    /// Gate every generated statement passes before execution.
    pub sql_policy: Arc<SqlPolicy>,
    /// Text-completion backend that turns questions into SQL.
    pub completion: Arc<dyn CompletionGateway>,
}
