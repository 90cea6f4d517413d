//! Committee engine: runs the selected predictors and votes on their outputs

use crate::config::CommitteeConfig;
use crate::error::{PredictorError, Result};
use crate::metrics::CommitteeMetrics;
use crate::models::aggregator::ConsensusAggregator;
use crate::models::normalizer::LabelNormalizer;
use crate::models::registry::{PredictorRegistry, RegisteredPredictor};
use crate::types::prediction::{Prediction, PredictorId};
use crate::types::report::{CommitteeReport, ConfidenceBandThresholds, PredictorFailure};
use crate::types::task::{QaOptions, Task, TaskInput};
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Outcome of a single predictor call
struct PredictorOutcome {
    id: PredictorId,
    result: std::result::Result<Prediction, PredictorError>,
    elapsed: Duration,
}

/// Runs a committee of predictors and aggregates their votes.
pub struct CommitteeEngine {
    /// Predictors available per task
    registry: PredictorRegistry,
    /// Sentiment label normalizer
    normalizer: LabelNormalizer,
    /// Majority-vote aggregator
    aggregator: ConsensusAggregator,
    /// Confidence band thresholds for reports
    band_thresholds: ConfidenceBandThresholds,
    /// Upper bound on a single predictor call
    predictor_timeout: Duration,
    /// Options handed to question-answering predictors
    qa_options: QaOptions,
    metrics: Arc<CommitteeMetrics>,
}

impl CommitteeEngine {
    /// Create an engine over a registry
    pub fn new(registry: PredictorRegistry, config: &CommitteeConfig) -> Self {
        info!(
            predictors = registry.len(),
            unmapped_labels = ?config.unmapped_labels,
            timeout_ms = config.predictor_timeout_ms,
            "Committee engine initialized"
        );

        Self {
            registry,
            normalizer: LabelNormalizer::new(config.unmapped_labels),
            aggregator: ConsensusAggregator::new(),
            band_thresholds: config.confidence_bands.clone(),
            predictor_timeout: Duration::from_millis(config.predictor_timeout_ms),
            qa_options: config.qa.clone(),
            metrics: Arc::new(CommitteeMetrics::new()),
        }
    }

    /// Share a metrics collector with the engine
    pub fn with_metrics(mut self, metrics: Arc<CommitteeMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn registry(&self) -> &PredictorRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut PredictorRegistry {
        &mut self.registry
    }

    /// Tear the engine down, handing the registry back
    pub fn into_registry(self) -> PredictorRegistry {
        self.registry
    }

    pub fn metrics(&self) -> &Arc<CommitteeMetrics> {
        &self.metrics
    }

    /// Run the task's default selection on an input
    pub async fn evaluate_default(&self, input: TaskInput) -> Result<CommitteeReport> {
        let selection = self.registry.default_selection(input.task());
        let names: Vec<&str> = selection.iter().map(PredictorId::as_str).collect();
        self.evaluate(input, names.as_slice()).await
    }

    /// Run the selected predictors on an input and vote on their outputs.
    ///
    /// Question-answering inputs carry the engine's configured QA options.
    /// Predictors run concurrently on the blocking pool; their results are
    /// collected in registry order before voting. Failed predictors are left
    /// out of the vote and listed in the report.
    pub async fn evaluate<S: AsRef<str>>(
        &self,
        input: TaskInput,
        selection: &[S],
    ) -> Result<CommitteeReport> {
        self.metrics.record_request();

        let result = self.run(input, selection).await;
        match &result {
            Ok(report) => self.metrics.record_consensus(report.consensus.agreement_ratio),
            Err(e) => {
                self.metrics.record_request_failure();
                warn!(error = %e, "Committee request failed");
            }
        }
        result
    }

    async fn run<S: AsRef<str>>(&self, input: TaskInput, selection: &[S]) -> Result<CommitteeReport> {
        let task = input.task();
        input.validate()?;
        let input = input.with_qa_options(self.qa_options.clone());
        let selected = self.registry.resolve(task, selection)?;

        let outcomes = self.invoke_all(task, Arc::new(input), selected).await;

        let mut predictions = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();

        for outcome in outcomes {
            self.metrics
                .record_predictor_time(outcome.id.as_str(), outcome.elapsed);

            match outcome.result {
                Ok(prediction) => {
                    debug!(
                        model = %prediction.source,
                        label = %prediction.label,
                        confidence = prediction.confidence,
                        elapsed_us = outcome.elapsed.as_micros() as u64,
                        "Predictor answered"
                    );
                    predictions.push(prediction);
                }
                Err(e) => {
                    error!(task = %task, model = %outcome.id, error = %e, "Predictor failed");
                    self.metrics.record_predictor_failure(outcome.id.as_str());
                    failures.push(PredictorFailure {
                        source: outcome.id,
                        error: e,
                    });
                }
            }
        }

        let consensus = self.aggregator.aggregate(&predictions)?;

        debug!(
            task = %task,
            winning_label = %consensus.winning_label,
            agreement_ratio = consensus.agreement_ratio,
            failures = failures.len(),
            "Committee vote complete"
        );

        Ok(CommitteeReport::new(task, predictions, consensus, &self.band_thresholds)
            .with_failures(failures))
    }

    /// Call every selected predictor, preserving selection order
    async fn invoke_all(
        &self,
        task: Task,
        input: Arc<TaskInput>,
        selected: Vec<RegisteredPredictor>,
    ) -> Vec<PredictorOutcome> {
        let calls = selected.into_iter().map(|entry| {
            let input = Arc::clone(&input);
            async move {
                let start = Instant::now();
                let predictor = Arc::clone(&entry.predictor);
                let handle = tokio::task::spawn_blocking(move || predictor.predict(&input));

                let raw = match tokio::time::timeout(self.predictor_timeout, handle).await {
                    Ok(Ok(result)) => result,
                    Ok(Err(join_error)) => Err(PredictorError::Inference(format!(
                        "predictor aborted: {}",
                        join_error
                    ))),
                    Err(_) => Err(PredictorError::Timeout(
                        self.predictor_timeout.as_millis() as u64,
                    )),
                };

                let result = raw
                    .and_then(|raw| Prediction::from_raw(entry.id.clone(), &raw))
                    .and_then(|prediction| self.normalize(task, prediction));

                PredictorOutcome {
                    id: entry.id,
                    result,
                    elapsed: start.elapsed(),
                }
            }
        });

        join_all(calls).await
    }

    /// Map sentiment labels onto the canonical domain; other tasks vote on raw labels
    fn normalize(
        &self,
        task: Task,
        prediction: Prediction,
    ) -> std::result::Result<Prediction, PredictorError> {
        if task != Task::Sentiment {
            return Ok(prediction);
        }

        let label = self
            .normalizer
            .normalize(&prediction.label, prediction.confidence)?;
        Ok(prediction.relabel(label))
    }
}

impl std::fmt::Debug for CommitteeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitteeEngine")
            .field("registry", &self.registry)
            .field("normalizer", &self.normalizer)
            .field("predictor_timeout", &self.predictor_timeout)
            .field("qa_options", &self.qa_options)
            .finish()
    }
}
