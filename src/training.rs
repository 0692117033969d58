//! Background model training.
//!
//! A job fetches history, builds the labeled dataset and hands it to a
//! [`Trainer`] on a blocking thread. The outcome comes back on a oneshot
//! channel owned by the caller; there is no shared status registry.
//!
//! Models that implement [`Predictor`](crate::domain::prediction::Predictor)
//! score fresh candles through
//! [`predict_latest`](crate::domain::analysis::predict_latest).

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::domain::error::TraderError;
use crate::domain::indicator::IndicatorParams;
use crate::domain::labeler::{build_dataset, Dataset};
use crate::ports::history_port::HistoryPort;

pub const DEFAULT_TRAINING_LIMIT: usize = 1500;
pub const DEFAULT_MIN_ROWS: usize = 200;

/// Fits a model to a labeled dataset. Runs on a blocking thread.
pub trait Trainer: Send + Sync + 'static {
    type Model: Send + 'static;

    fn train(&self, dataset: &Dataset) -> Result<Self::Model, TraderError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingRequest {
    pub symbol: String,
    pub interval: String,
    pub limit: usize,
    pub min_rows: usize,
    pub params: IndicatorParams,
}

impl TrainingRequest {
    pub fn new(symbol: impl Into<String>, interval: impl Into<String>) -> Self {
        TrainingRequest {
            symbol: symbol.into().to_uppercase(),
            interval: interval.into(),
            limit: DEFAULT_TRAINING_LIMIT,
            min_rows: DEFAULT_MIN_ROWS,
            params: IndicatorParams::default(),
        }
    }
}

#[derive(Debug)]
pub struct TrainingOutcome<M> {
    pub symbol: String,
    pub interval: String,
    /// Dataset rows the trainer saw; 0 if the job failed before training.
    pub rows: usize,
    pub result: Result<M, TraderError>,
}

/// Spawn a training job and return the channel its outcome arrives on.
///
/// Dropping the receiver does not cancel the job; its outcome is discarded.
pub fn submit_training<T: Trainer>(
    history: Arc<dyn HistoryPort>,
    trainer: Arc<T>,
    request: TrainingRequest,
) -> oneshot::Receiver<TrainingOutcome<T::Model>> {
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let outcome = run_job(history.as_ref(), trainer, &request).await;
        match &outcome.result {
            Ok(_) => info!(
                symbol = %outcome.symbol,
                interval = %outcome.interval,
                rows = outcome.rows,
                "training finished"
            ),
            Err(e) => warn!(
                symbol = %outcome.symbol,
                interval = %outcome.interval,
                error = %e,
                "training failed"
            ),
        }
        let _ = tx.send(outcome);
    });

    rx
}

async fn run_job<T: Trainer>(
    history: &dyn HistoryPort,
    trainer: Arc<T>,
    request: &TrainingRequest,
) -> TrainingOutcome<T::Model> {
    let failed = |e: TraderError| TrainingOutcome {
        symbol: request.symbol.clone(),
        interval: request.interval.clone(),
        rows: 0,
        result: Err(e),
    };

    let candles = match history
        .fetch_klines(&request.symbol, &request.interval, request.limit)
        .await
    {
        Ok(candles) => candles,
        Err(e) => return failed(e),
    };

    let dataset = build_dataset(&candles, &request.params);
    if dataset.len() < request.min_rows {
        return failed(TraderError::InsufficientHistory {
            have: dataset.len(),
            need: request.min_rows,
        });
    }

    let rows = dataset.len();
    let result = tokio::task::spawn_blocking(move || trainer.train(&dataset))
        .await
        .unwrap_or_else(|e| {
            Err(TraderError::Training {
                reason: format!("trainer task panicked or was cancelled: {e}"),
            })
        });

    TrainingOutcome {
        symbol: request.symbol.clone(),
        interval: request.interval.clone(),
        rows,
        result,
    }
}
