use crate::{
    AppState,
    error::AppError,
    schema::{BacktestRequestBody, BacktestResponseBody},
};
use axum::{Json, extract::State, extract::rejection::JsonRejection};
use std::sync::Arc;

/// # POST /v1/backtest
/// Validates the request, then runs the pipeline on a blocking thread since
/// loading a dataset reads from disk.
pub async fn run_backtest(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BacktestRequestBody>, JsonRejection>,
) -> Result<Json<BacktestResponseBody>, AppError> {
    let Json(body) = payload?;
    let request = body.validate().map_err(AppError::Validation)?;
    tracing::info!(
        field = %request.data_field,
        calendar = request.calendar.name(),
        filter = request.filter.name(),
        weighting = request.weighting.name(),
        "Backtest requested."
    );

    let service = state.service.clone();
    let result = tokio::task::spawn_blocking(move || service.run(&request)).await??;
    Ok(Json(result.into()))
}

/// # GET /v1/health
pub async fn health() -> &'static str {
    "OK"
}
