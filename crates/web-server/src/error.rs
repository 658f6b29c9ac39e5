use crate::schema::FieldError;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use backtester::BacktestError;
use data_provider::DataError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Request validation failed")]
    Validation(Vec<FieldError>),
    #[error("Malformed request body: {0}")]
    MalformedBody(#[from] JsonRejection),
    #[error("Backtest error: {0}")]
    Backtest(#[from] BacktestError),
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match self {
            AppError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Request validation failed".to_string(),
                errors,
            ),
            AppError::MalformedBody(rejection) => {
                (rejection.status(), rejection.body_text(), Vec::new())
            }
            AppError::Backtest(err) => {
                let status = backtest_status(&err);
                if status.is_server_error() {
                    tracing::error!(error = ?err, "Backtest failed.");
                } else {
                    tracing::warn!(error = %err, "Backtest rejected.");
                }
                (status, err.to_string(), Vec::new())
            }
            AppError::Task(join_err) => {
                tracing::error!(error = ?join_err, "Backtest task failed.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred while running the backtest".to_string(),
                    Vec::new(),
                )
            }
        };

        let body = if details.is_empty() {
            Json(json!({ "error": error_message }))
        } else {
            Json(json!({ "error": error_message, "details": details }))
        };
        (status, body).into_response()
    }
}

fn backtest_status(err: &BacktestError) -> StatusCode {
    match err {
        BacktestError::InvalidRange { .. }
        | BacktestError::InvalidParameter { .. }
        | BacktestError::InfeasibleAllocation(_) => StatusCode::BAD_REQUEST,
        BacktestError::Data(DataError::DataUnavailable { .. }) => StatusCode::NOT_FOUND,
        BacktestError::UnsupportedRule { .. }
        | BacktestError::Data(_)
        | BacktestError::Dataset(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
