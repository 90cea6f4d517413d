//! Sentiment label normalization
//!
//! Sentiment models disagree on vocabulary: SST-2 models emit
//! `POSITIVE`/`NEGATIVE`, star-rating models emit `"1 star"`..`"5 stars"`,
//! and some checkpoints only expose `LABEL_n`. Votes are only comparable
//! once collapsed onto a two-valued domain.

use serde::Deserialize;
use std::fmt;
use tracing::warn;

use crate::error::NormalizationError;

/// Canonical sentiment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Positive,
    Negative,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "POSITIVE",
            Sentiment::Negative => "NEGATIVE",
        }
    }

    /// Map a raw model label onto the canonical domain.
    ///
    /// Neutral labels lean positive only when the model's score is strictly
    /// above 0.5. Returns `None` for labels outside the known vocabulary.
    pub fn from_raw(raw_label: &str, score: f64) -> Option<Self> {
        match raw_label {
            "POSITIVE" | "LABEL_4" | "LABEL_5" | "5 stars" | "4 stars" => Some(Sentiment::Positive),
            "NEGATIVE" | "LABEL_1" | "LABEL_2" | "1 star" | "2 stars" => Some(Sentiment::Negative),
            "LABEL_3" | "3 stars" => Some(if score > 0.5 {
                Sentiment::Positive
            } else {
                Sentiment::Negative
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do with a label outside the known vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnmappedLabelPolicy {
    /// Keep the raw label and log a warning
    #[default]
    PassThrough,
    /// Fail with `NormalizationError::UnmappedLabel`
    Reject,
}

/// Collapses model-specific sentiment labels into `POSITIVE` / `NEGATIVE`.
#[derive(Debug, Clone, Default)]
pub struct LabelNormalizer {
    policy: UnmappedLabelPolicy,
}

impl LabelNormalizer {
    pub fn new(policy: UnmappedLabelPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> UnmappedLabelPolicy {
        self.policy
    }

    /// Normalize a raw label given the model's score for it.
    pub fn normalize(&self, raw_label: &str, score: f64) -> Result<String, NormalizationError> {
        if let Some(sentiment) = Sentiment::from_raw(raw_label, score) {
            return Ok(sentiment.as_str().to_string());
        }

        match self.policy {
            UnmappedLabelPolicy::PassThrough => {
                warn!(label = %raw_label, score = score, "Unmapped sentiment label, passing through");
                Ok(raw_label.to_string())
            }
            UnmappedLabelPolicy::Reject => {
                Err(NormalizationError::UnmappedLabel(raw_label.to_string()))
            }
        }
    }
}
