//! Type definitions for the committee pipeline

pub mod prediction;
pub mod report;
pub mod task;

pub use prediction::{Prediction, PredictorId, RawOutput};
pub use report::{
    CommitteeReport, ConfidenceBand, ConfidenceBandThresholds, ConsensusResult, LabelCount,
    PredictorFailure,
};
pub use task::{ImageInput, QaOptions, Task, TaskInput};
