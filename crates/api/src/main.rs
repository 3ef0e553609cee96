use std::net::SocketAddr;
use std::sync::Arc;

use patrimoni_api::config::ServerConfig;
use patrimoni_api::router::build_app_router;
use patrimoni_api::state::AppState;
use patrimoni_completion::CompletionApi;
use patrimoni_core::normalizer::{Normalizer, SynonymTable};
use patrimoni_core::sql_guard::SqlPolicy;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "patrimoni_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = patrimoni_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    patrimoni_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    patrimoni_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Query bridge ---
    let synonyms = match &config.synonyms_path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .unwrap_or_else(|e| panic!("Failed to read synonym table '{path}': {e}"));
            SynonymTable::from_json(&raw)
                .unwrap_or_else(|e| panic!("Invalid synonym table '{path}': {e}"))
        }
        None => SynonymTable::builtin(),
    };
    tracing::info!(entries = synonyms.len(), "Synonym table loaded");
    let normalizer = Normalizer::new(synonyms).expect("Synonym table is not idempotent");

    let completion =
        CompletionApi::new(config.completion.clone()).expect("Failed to build completion client");
    tracing::info!(
        model = %config.completion.model,
        url = %config.completion.api_url,
        "Completion client ready",
    );

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        normalizer: Arc::new(normalizer),
        sql_policy: Arc::new(SqlPolicy::default()),
        completion: Arc::new(completion),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Resolve on SIGINT, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
