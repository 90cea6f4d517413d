//! Error types for the committee pipeline

use crate::types::task::Task;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the consensus aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregationError {
    /// No predictions reached the aggregator (nothing selected, or every predictor failed)
    #[error("insufficient input: at least one prediction is required")]
    InsufficientInput,
}

/// Errors raised by the sentiment label normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "label")]
pub enum NormalizationError {
    /// Raw label outside the known sentiment vocabulary
    #[error("unmapped sentiment label: {0}")]
    UnmappedLabel(String),
}

/// Error reported by a single predictor invocation.
///
/// Kept typed in `CommitteeReport::failures` so callers can tell a timeout
/// from a rejected label without parsing messages.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum PredictorError {
    /// The predictor does not handle this task
    #[error("predictor does not support task {0}")]
    UnsupportedTask(Task),

    /// The underlying model raised an error
    #[error("inference failed: {0}")]
    Inference(String),

    /// The raw model output could not be interpreted
    #[error("malformed output: {0}")]
    MalformedOutput(String),

    /// The call exceeded the configured timeout
    #[error("timed out after {0} ms")]
    Timeout(u64),

    /// The predicted sentiment label was rejected by the normalizer
    #[error(transparent)]
    Normalization(#[from] NormalizationError),
}

/// Request-level errors surfaced to the top-level caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommitteeError {
    /// The caller selected zero predictors
    #[error("no predictor selected for {0}")]
    NoPredictorSelected(Task),

    /// The task input is missing its text, image, question or context
    #[error("empty input for {task}: {reason}")]
    EmptyInput { task: Task, reason: String },

    /// A selected predictor name is not registered for the task
    #[error("unknown predictor '{name}' for {task}")]
    UnknownPredictor { task: Task, name: String },

    /// Aggregation could not produce a result
    #[error(transparent)]
    Aggregation(#[from] AggregationError),
}

pub type Result<T> = std::result::Result<T, CommitteeError>;
