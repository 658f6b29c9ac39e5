use crate::calendar::select_dates;
use crate::error::BacktestError;
use crate::filter::select_securities;
use crate::weighting::compute_weights;
use core_types::{BacktestRequest, BacktestResult, Dataset, WeightTable};
use data_provider::DatasetProvider;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Runs backtest requests against datasets supplied by a provider.
///
/// Cheap to clone; every run loads its own dataset so concurrent runs share
/// nothing mutable.
#[derive(Clone)]
pub struct BacktestService {
    provider: Arc<dyn DatasetProvider>,
}

impl BacktestService {
    pub fn new(provider: Arc<dyn DatasetProvider>) -> Self {
        Self { provider }
    }

    /// Loads the requested field and runs the pipeline over it.
    ///
    /// Loading is synchronous; async callers should hop onto a blocking
    /// thread before calling this.
    pub fn run(&self, request: &BacktestRequest) -> Result<BacktestResult, BacktestError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("backtest", %run_id, field = %request.data_field);
        let _entered = span.enter();

        let dataset = self.provider.load(request.data_field)?;
        tracing::debug!(
            dates = dataset.height(),
            securities = dataset.width(),
            "Dataset loaded."
        );

        run_pipeline(&dataset, request)
    }
}

/// Calendar, filter and weighting stages in that order.
///
/// The elapsed time covers only the three stages. An empty dataset after
/// filtering gives an empty weight table rather than an error.
pub fn run_pipeline(
    dataset: &Dataset,
    request: &BacktestRequest,
) -> Result<BacktestResult, BacktestError> {
    let started = Instant::now();

    let dated = select_dates(dataset, &request.calendar)?;
    tracing::debug!(rule = request.calendar.name(), dates = dated.height(), "Calendar stage done.");

    let filtered = select_securities(&dated, &request.filter)?;
    tracing::debug!(
        rule = request.filter.name(),
        dates = filtered.height(),
        securities = filtered.width(),
        "Filter stage done."
    );

    let weights = if filtered.is_empty() {
        WeightTable::new()
    } else {
        compute_weights(&filtered, &request.weighting)?
    };

    let execution_time = started.elapsed();
    tracing::info!(
        weighting = request.weighting.name(),
        dates = weights.len(),
        elapsed_ms = execution_time.as_secs_f64() * 1000.0,
        "Backtest complete."
    );

    Ok(BacktestResult { execution_time, weights })
}
