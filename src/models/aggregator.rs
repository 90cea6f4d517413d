//! Majority-vote aggregation for multi-model committees

use tracing::debug;

use crate::error::AggregationError;
use crate::types::prediction::Prediction;
use crate::types::report::{ConsensusResult, LabelCount};

/// Reduces independent predictions into a single consensus.
///
/// Labels are counted in order of first appearance so that ties resolve to
/// the label seen first; callers control the tie-break through input order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsensusAggregator;

impl ConsensusAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Aggregate predictions into a consensus result.
    pub fn aggregate(&self, predictions: &[Prediction]) -> Result<ConsensusResult, AggregationError> {
        if predictions.is_empty() {
            return Err(AggregationError::InsufficientInput);
        }

        let distribution = Self::distribution(predictions);

        // Strict `>` keeps the earliest label among equal counts
        let mut winner = &distribution[0];
        for entry in &distribution[1..] {
            if entry.count > winner.count {
                winner = entry;
            }
        }

        let total = predictions.len() as f64;
        let mean_confidence = predictions.iter().map(|p| p.confidence).sum::<f64>() / total;
        let agreement_ratio = winner.count as f64 / total;

        debug!(
            winning_label = %winner.label,
            votes = winner.count,
            total = predictions.len(),
            mean_confidence = mean_confidence,
            "Consensus reached"
        );

        Ok(ConsensusResult {
            winning_label: winner.label.clone(),
            mean_confidence,
            agreement_ratio,
            distribution,
        })
    }

    /// Vote counts per label, in order of first appearance.
    pub fn distribution(predictions: &[Prediction]) -> Vec<LabelCount> {
        let mut counts: Vec<LabelCount> = Vec::new();

        for prediction in predictions {
            match counts.iter_mut().find(|entry| entry.label == prediction.label) {
                Some(entry) => entry.count += 1,
                None => counts.push(LabelCount {
                    label: prediction.label.clone(),
                    count: 1,
                }),
            }
        }

        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn votes(pairs: &[(&str, f64)]) -> Vec<Prediction> {
        pairs
            .iter()
            .enumerate()
            .map(|(i, (label, confidence))| Prediction::new(format!("model{}", i + 1), *label, *confidence))
            .collect()
    }

    #[test]
    fn test_majority_vote() {
        let aggregator = ConsensusAggregator::new();
        let predictions = votes(&[("POSITIVO", 0.9), ("POSITIVO", 0.8), ("NEGATIVO", 0.6)]);

        let result = aggregator.aggregate(&predictions).unwrap();

        assert_eq!(result.winning_label, "POSITIVO");
        assert!((result.mean_confidence - 0.7667).abs() < 0.001);
        assert!((result.agreement_ratio - 0.667).abs() < 0.001);
        assert_eq!(
            result.distribution,
            vec![
                LabelCount { label: "POSITIVO".to_string(), count: 2 },
                LabelCount { label: "NEGATIVO".to_string(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        let aggregator = ConsensusAggregator::new();
        assert_eq!(aggregator.aggregate(&[]), Err(AggregationError::InsufficientInput));
    }

    #[test]
    fn test_tie_break_first_seen() {
        let aggregator = ConsensusAggregator::new();

        let result = aggregator.aggregate(&votes(&[("A", 0.9), ("B", 0.9)])).unwrap();
        assert_eq!(result.winning_label, "A");

        let result = aggregator.aggregate(&votes(&[("B", 0.9), ("A", 0.9)])).unwrap();
        assert_eq!(result.winning_label, "B");

        // A later label has to strictly outnumber to win
        let result = aggregator
            .aggregate(&votes(&[("B", 0.1), ("A", 0.9), ("A", 0.9), ("B", 0.1), ("C", 0.5)]))
            .unwrap();
        assert_eq!(result.winning_label, "B");
        assert!((result.agreement_ratio - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_distribution_sums_to_input() {
        let aggregator = ConsensusAggregator::new();
        let predictions = votes(&[
            ("cat", 0.7),
            ("dog", 0.6),
            ("cat", 0.5),
            ("bird", 0.2),
            ("dog", 0.9),
            ("cat", 0.3),
        ]);

        let result = aggregator.aggregate(&predictions).unwrap();

        assert_eq!(result.total_votes(), predictions.len());
        assert_eq!(result.winning_label, "cat");
        assert!(
            (result.agreement_ratio - result.count("cat") as f64 / predictions.len() as f64).abs()
                < 1e-12
        );
        assert!(result.agreement_ratio > 0.0 && result.agreement_ratio <= 1.0);
    }

    #[test]
    fn test_mean_confidence_ignores_labels() {
        let aggregator = ConsensusAggregator::new();

        let a = aggregator
            .aggregate(&votes(&[("x", 0.2), ("y", 0.4), ("x", 0.9)]))
            .unwrap();
        let b = aggregator
            .aggregate(&votes(&[("y", 0.2), ("y", 0.4), ("z", 0.9)]))
            .unwrap();

        assert!((a.mean_confidence - b.mean_confidence).abs() < 1e-12);
        assert!((a.mean_confidence - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_single_prediction() {
        let aggregator = ConsensusAggregator::new();
        let result = aggregator.aggregate(&votes(&[("Brasilia", 0.42)])).unwrap();

        assert_eq!(result.winning_label, "Brasilia");
        assert_eq!(result.agreement_ratio, 1.0);
        assert!((result.mean_confidence - 0.42).abs() < 1e-12);
    }
}
