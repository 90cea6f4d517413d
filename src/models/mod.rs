//! Committee components: predictors, normalization and voting

pub mod aggregator;
pub mod inference;
pub mod normalizer;
pub mod predictor;
pub mod registry;

pub use aggregator::ConsensusAggregator;
pub use inference::CommitteeEngine;
pub use normalizer::{LabelNormalizer, Sentiment, UnmappedLabelPolicy};
pub use predictor::{Predictor, ReplayPredictor};
pub use registry::{PredictorRegistry, RegisteredPredictor};
