//! Configuration management for the model committee

use crate::models::normalizer::UnmappedLabelPolicy;
use crate::types::report::ConfidenceBandThresholds;
use crate::types::task::{QaOptions, Task};
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub committee: CommitteeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// A pretrained model offered to the user for one task
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModelSpec {
    /// Display name, also used to select the model
    pub name: String,
    /// Model hub identifier
    pub model: String,
    /// Framework the checkpoint is loaded with
    #[serde(default = "default_framework")]
    pub framework: String,
    /// Whether the model is selected when the user makes no choice
    #[serde(default)]
    pub selected_by_default: bool,
}

fn default_framework() -> String {
    "pt".to_string()
}

impl ModelSpec {
    fn new(name: &str, model: &str, selected_by_default: bool) -> Self {
        Self {
            name: name.to_string(),
            model: model.to_string(),
            framework: default_framework(),
            selected_by_default,
        }
    }
}

/// Models available per task, in presentation order
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    #[serde(default = "default_sentiment_models")]
    pub sentiment: Vec<ModelSpec>,
    #[serde(default = "default_image_models")]
    pub image: Vec<ModelSpec>,
    #[serde(default = "default_qa_models")]
    pub qa: Vec<ModelSpec>,
}

fn default_sentiment_models() -> Vec<ModelSpec> {
    vec![
        ModelSpec::new("BERT", "nlptown/bert-base-multilingual-uncased-sentiment", true),
        ModelSpec::new("RoBERTa", "cardiffnlp/twitter-roberta-base-sentiment", false),
        ModelSpec::new(
            "DistilBERT",
            "distilbert-base-uncased-finetuned-sst-2-english",
            false,
        ),
    ]
}

fn default_image_models() -> Vec<ModelSpec> {
    vec![
        ModelSpec::new("ResNet", "microsoft/resnet-50", true),
        ModelSpec::new("ViT", "google/vit-base-patch16-224", false),
        ModelSpec::new("BEiT", "microsoft/beit-base-patch16-224", false),
    ]
}

fn default_qa_models() -> Vec<ModelSpec> {
    vec![
        ModelSpec::new("RoBERTa-SQuAD", "deepset/roberta-base-squad2", true),
        ModelSpec::new("BERT-SQuAD", "deepset/bert-base-cased-squad2", false),
        ModelSpec::new("DistilBERT-SQuAD", "distilbert-base-cased-distilled-squad", false),
    ]
}

impl ModelsConfig {
    /// Models configured for a task
    pub fn for_task(&self, task: Task) -> &[ModelSpec] {
        match task {
            Task::Sentiment => &self.sentiment,
            Task::ImageClassification => &self.image,
            Task::QuestionAnswering => &self.qa,
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            sentiment: default_sentiment_models(),
            image: default_image_models(),
            qa: default_qa_models(),
        }
    }
}

/// Committee behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct CommitteeConfig {
    /// Policy for sentiment labels outside the known vocabulary
    #[serde(default)]
    pub unmapped_labels: UnmappedLabelPolicy,
    /// Confidence band thresholds
    #[serde(default)]
    pub confidence_bands: ConfidenceBandThresholds,
    /// Per-predictor timeout in milliseconds
    #[serde(default = "default_predictor_timeout_ms")]
    pub predictor_timeout_ms: u64,
    /// Options forwarded to question-answering predictors
    #[serde(default)]
    pub qa: QaOptions,
}

fn default_predictor_timeout_ms() -> u64 {
    30_000
}

impl Default for CommitteeConfig {
    fn default() -> Self {
        Self {
            unmapped_labels: UnmappedLabelPolicy::PassThrough,
            confidence_bands: ConfidenceBandThresholds::default(),
            predictor_timeout_ms: default_predictor_timeout_ms(),
            qa: QaOptions::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a specific path.
    ///
    /// `COMMITTEE__`-prefixed environment variables override file values
    /// (e.g. `COMMITTEE__LOGGING__LEVEL=debug`).
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("COMMITTEE")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the committee cannot run with
    pub fn validate(&self) -> Result<()> {
        let bands = &self.committee.confidence_bands;
        if !(0.0..=1.0).contains(&bands.moderate)
            || !(0.0..=1.0).contains(&bands.high)
            || bands.moderate > bands.high
        {
            anyhow::bail!(
                "Invalid confidence bands: moderate={} high={}",
                bands.moderate,
                bands.high
            );
        }

        for task in Task::ALL {
            let models = self.models.for_task(task);
            for (i, spec) in models.iter().enumerate() {
                if models[..i].iter().any(|other| other.name == spec.name) {
                    anyhow::bail!("Duplicate model name '{}' for {}", spec.name, task);
                }
            }
        }

        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            models: ModelsConfig::default(),
            committee: CommitteeConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.models.sentiment.len(), 3);
        assert_eq!(config.models.image[0].name, "ResNet");
        assert_eq!(config.models.qa[2].model, "distilbert-base-cased-distilled-squad");
        assert_eq!(config.committee.unmapped_labels, UnmappedLabelPolicy::PassThrough);
        assert_eq!(config.committee.confidence_bands.high, 0.8);
        assert_eq!(config.committee.qa.max_answer_len, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_one_default_selection_per_task() {
        let config = AppConfig::default();
        for task in Task::ALL {
            let selected: Vec<_> = config
                .models
                .for_task(task)
                .iter()
                .filter(|m| m.selected_by_default)
                .collect();
            assert_eq!(selected.len(), 1, "task {}", task);
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[committee]
unmapped_labels = "reject"
predictor_timeout_ms = 500

[committee.confidence_bands]
high = 0.9
moderate = 0.6

[[models.sentiment]]
name = "DistilBERT"
model = "distilbert-base-uncased-finetuned-sst-2-english"
selected_by_default = true

[logging]
level = "debug"
format = "json"
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.committee.unmapped_labels, UnmappedLabelPolicy::Reject);
        assert_eq!(config.committee.predictor_timeout_ms, 500);
        assert_eq!(config.committee.confidence_bands.high, 0.9);
        assert_eq!(config.models.sentiment.len(), 1);
        assert_eq!(config.models.sentiment[0].framework, "pt");
        // Unlisted tasks keep their default models
        assert_eq!(config.models.image.len(), 3);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_invalid_bands_rejected() {
        let mut config = AppConfig::default();
        config.committee.confidence_bands = ConfidenceBandThresholds {
            high: 0.4,
            moderate: 0.6,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_model_names_rejected() {
        let mut config = AppConfig::default();
        config.models.qa.push(config.models.qa[0].clone());
        assert!(config.validate().is_err());
    }
}
