//! Predictor identities, raw pipeline outputs and predictions

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PredictorError;

/// Name of a predictor within its task (e.g. "BERT", "ViT")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictorId(String);

impl PredictorId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PredictorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PredictorId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// One label/score pair of a classification pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredLabel {
    pub label: String,
    pub score: f64,
}

/// Extracted answer span of a question-answering pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerSpan {
    pub answer: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<usize>,
}

/// Output of a pretrained pipeline, in the shape the pipeline returns it.
///
/// Classification pipelines (sentiment, image) return candidates ranked by
/// score; question answering returns a single answer span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawOutput {
    Ranked(Vec<ScoredLabel>),
    Answer(AnswerSpan),
}

impl RawOutput {
    pub fn label(label: impl Into<String>, score: f64) -> Self {
        RawOutput::Ranked(vec![ScoredLabel {
            label: label.into(),
            score,
        }])
    }

    pub fn answer(answer: impl Into<String>, score: f64) -> Self {
        RawOutput::Answer(AnswerSpan {
            answer: answer.into(),
            score,
            start: None,
            end: None,
        })
    }

    /// Top label and its score.
    ///
    /// The first ranked candidate is taken as the pipeline's answer.
    pub fn top(&self) -> Result<(&str, f64), PredictorError> {
        let (label, score) = match self {
            RawOutput::Ranked(candidates) => {
                let first = candidates.first().ok_or_else(|| {
                    PredictorError::MalformedOutput("empty candidate list".to_string())
                })?;
                (first.label.as_str(), first.score)
            }
            RawOutput::Answer(span) => (span.answer.as_str(), span.score),
        };

        if !score.is_finite() || !(0.0..=1.0).contains(&score) {
            return Err(PredictorError::MalformedOutput(format!(
                "score {} outside [0, 1]",
                score
            )));
        }

        Ok((label, score))
    }
}

/// A single predictor's vote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predictor that produced the vote
    pub source: PredictorId,
    /// Label used for voting (normalized for the sentiment task)
    pub label: String,
    /// Predictor confidence (0.0 - 1.0)
    pub confidence: f64,
    /// Label as emitted by the model, when normalization changed it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_label: Option<String>,
}

impl Prediction {
    pub fn new(source: impl Into<PredictorId>, label: impl Into<String>, confidence: f64) -> Self {
        Self {
            source: source.into(),
            label: label.into(),
            confidence,
            raw_label: None,
        }
    }

    /// Build a prediction from a pipeline's top answer
    pub fn from_raw(source: PredictorId, raw: &RawOutput) -> Result<Self, PredictorError> {
        let (label, score) = raw.top()?;
        Ok(Self {
            source,
            label: label.to_string(),
            confidence: score,
            raw_label: None,
        })
    }

    /// Replace the voting label, remembering the original one
    pub fn relabel(mut self, label: String) -> Self {
        if label != self.label {
            self.raw_label = Some(std::mem::replace(&mut self.label, label));
        }
        self
    }
}

impl From<String> for PredictorId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_classification_output() {
        let raw: RawOutput =
            serde_json::from_str(r#"[{"label":"4 stars","score":0.62},{"label":"5 stars","score":0.2}]"#)
                .unwrap();
        assert_eq!(raw.top().unwrap(), ("4 stars", 0.62));
    }

    #[test]
    fn test_parse_answer_output() {
        let raw: RawOutput =
            serde_json::from_str(r#"{"answer":"Brasilia","score":0.91,"start":0,"end":8}"#)
                .unwrap();
        assert_eq!(raw.top().unwrap(), ("Brasilia", 0.91));
    }

    #[test]
    fn test_malformed_outputs() {
        assert!(matches!(
            RawOutput::Ranked(vec![]).top(),
            Err(PredictorError::MalformedOutput(_))
        ));
        assert!(RawOutput::label("cat", 1.5).top().is_err());
        assert!(RawOutput::label("cat", f64::NAN).top().is_err());
    }

    #[test]
    fn test_relabel_keeps_raw_label() {
        let prediction = Prediction::new("BERT", "5 stars", 0.7).relabel("POSITIVE".to_string());
        assert_eq!(prediction.label, "POSITIVE");
        assert_eq!(prediction.raw_label.as_deref(), Some("5 stars"));

        let unchanged = Prediction::new("DistilBERT", "POSITIVE", 0.9).relabel("POSITIVE".to_string());
        assert_eq!(unchanged.raw_label, None);
    }
}
