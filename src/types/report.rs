//! Consensus results and committee reports

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PredictorError;
use crate::types::prediction::{Prediction, PredictorId};
use crate::types::task::Task;

/// Number of votes a label received
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

/// Majority-vote summary of a set of predictions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    /// Most voted label (first seen wins on ties)
    pub winning_label: String,
    /// Mean confidence of all votes, regardless of label
    pub mean_confidence: f64,
    /// Share of votes that went to the winning label
    pub agreement_ratio: f64,
    /// Vote counts in order of first appearance
    pub distribution: Vec<LabelCount>,
}

impl ConsensusResult {
    /// Votes received by a label (0 if absent)
    pub fn count(&self, label: &str) -> usize {
        self.distribution
            .iter()
            .find(|entry| entry.label == label)
            .map(|entry| entry.count)
            .unwrap_or(0)
    }

    /// Total number of votes
    pub fn total_votes(&self) -> usize {
        self.distribution.iter().map(|entry| entry.count).sum()
    }

    /// Qualitative band for the mean confidence
    pub fn confidence_band(&self, thresholds: &ConfidenceBandThresholds) -> ConfidenceBand {
        ConfidenceBand::from_confidence(self.mean_confidence, thresholds)
    }
}

/// Qualitative confidence bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBand {
    Low,
    Moderate,
    High,
}

impl ConfidenceBand {
    /// Classify a mean confidence (strictly above a threshold to reach a band)
    pub fn from_confidence(confidence: f64, thresholds: &ConfidenceBandThresholds) -> Self {
        if confidence > thresholds.high {
            ConfidenceBand::High
        } else if confidence > thresholds.moderate {
            ConfidenceBand::Moderate
        } else {
            ConfidenceBand::Low
        }
    }

    /// Note shown under question-answering results
    pub fn note(&self) -> &'static str {
        match self {
            ConfidenceBand::High => "High confidence!",
            ConfidenceBand::Moderate => "Moderate confidence.",
            ConfidenceBand::Low => "Low confidence - consider rephrasing the question.",
        }
    }
}

/// Configurable confidence band thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBandThresholds {
    pub high: f64,
    pub moderate: f64,
}

impl Default for ConfidenceBandThresholds {
    fn default() -> Self {
        Self {
            high: 0.8,
            moderate: 0.5,
        }
    }
}

/// A predictor that failed and was left out of the vote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictorFailure {
    pub source: PredictorId,
    pub error: PredictorError,
}

/// Full outcome of one committee request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitteeReport {
    /// Unique report identifier
    pub report_id: String,
    /// Task the committee worked on
    pub task: Task,
    /// Successful votes, in selection order
    pub predictions: Vec<Prediction>,
    /// Predictors excluded from the vote
    pub failures: Vec<PredictorFailure>,
    /// Consensus of the successful votes
    pub consensus: ConsensusResult,
    /// Band of the mean confidence
    pub confidence_band: ConfidenceBand,
    /// Report generation timestamp
    pub created_at: DateTime<Utc>,
}

impl CommitteeReport {
    pub fn new(
        task: Task,
        predictions: Vec<Prediction>,
        consensus: ConsensusResult,
        thresholds: &ConfidenceBandThresholds,
    ) -> Self {
        let confidence_band = consensus.confidence_band(thresholds);
        Self {
            report_id: uuid::Uuid::new_v4().to_string(),
            task,
            predictions,
            failures: Vec::new(),
            consensus,
            confidence_band,
            created_at: Utc::now(),
        }
    }

    pub fn with_failures(mut self, failures: Vec<PredictorFailure>) -> Self {
        self.failures = failures;
        self
    }

    /// True when at least one selected predictor was left out
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

impl fmt::Display for CommitteeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let consensus = &self.consensus;

        writeln!(f, "Final result:")?;
        writeln!(f, "{}: {}", self.task.outcome_title(), consensus.winning_label)?;
        writeln!(f, "Mean confidence: {:.2}%", consensus.mean_confidence * 100.0)?;
        writeln!(f, "Agreement rate: {:.2}%", consensus.agreement_ratio * 100.0)?;
        writeln!(f)?;

        writeln!(f, "Per-predictor details:")?;
        for prediction in &self.predictions {
            writeln!(
                f,
                "{}: {} ({:.2}%)",
                prediction.source,
                prediction.label,
                prediction.confidence * 100.0
            )?;
        }
        for failure in &self.failures {
            writeln!(f, "{}: failed ({})", failure.source, failure.error)?;
        }
        writeln!(f)?;

        match self.task {
            Task::QuestionAnswering => write!(f, "Note: {}", self.confidence_band.note()),
            Task::Sentiment | Task::ImageClassification => {
                writeln!(f, "Vote distribution:")?;
                let votes: Vec<String> = consensus
                    .distribution
                    .iter()
                    .map(|entry| format!("{}: {}", entry.label, entry.count))
                    .collect();
                write!(f, "{}", votes.join(", "))
            }
        }
    }
}
