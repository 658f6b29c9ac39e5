use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use backtester::BacktestService;
use configuration::{ServerSettings, Settings};
use data_provider::ParquetProvider;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;
pub mod schema;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub service: BacktestService,
}

/// Builds the application router with its middleware stack.
pub fn router(state: Arc<AppState>, settings: &ServerSettings) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    Router::new()
        .route("/v1/health", get(handlers::health))
        .route("/v1/backtest", post(handlers::run_backtest))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(settings.body_limit_bytes))
}

/// The main function to configure and run the web server.
///
/// Tracing must already be initialised by the caller.
pub async fn run_server(settings: Settings) -> anyhow::Result<()> {
    let provider = ParquetProvider::from_settings(&settings.data);
    tracing::info!(data_dir = %provider.data_dir().display(), "Using parquet dataset store.");

    let app_state = Arc::new(AppState {
        service: BacktestService::new(Arc::new(provider)),
    });
    let app = router(app_state, &settings.server);

    let addr = settings.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server started and listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Web server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for the shutdown signal.");
    }
}
