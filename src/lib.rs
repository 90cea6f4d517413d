//! Model Committee Library
//!
//! Runs several pretrained predictors on the same input and combines their
//! answers into a majority-vote consensus with confidence and agreement
//! statistics. Supports sentiment analysis, image classification and
//! question answering.

pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod session;
pub mod types;

pub use config::AppConfig;
pub use error::{AggregationError, CommitteeError, NormalizationError, PredictorError};
pub use models::{
    CommitteeEngine, ConsensusAggregator, LabelNormalizer, Predictor, PredictorRegistry,
    UnmappedLabelPolicy,
};
pub use session::ReplaySession;
pub use types::{
    CommitteeReport, ConfidenceBand, ConsensusResult, Prediction, PredictorId, RawOutput, Task,
    TaskInput,
};
