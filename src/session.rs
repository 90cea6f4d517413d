//! Recorded committee sessions
//!
//! A session file holds one task input and the raw output each model
//! produced for it, so a committee can be replayed without a model runtime:
//!
//! ```json
//! {
//!   "input": { "kind": "text", "text": "What a great day" },
//!   "outputs": {
//!     "BERT": [{ "label": "5 stars", "score": 0.71 }],
//!     "RoBERTa": { "error": "CUDA out of memory" }
//!   }
//! }
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::config::ModelSpec;
use crate::models::predictor::{Predictor, ReplayPredictor};
use crate::types::prediction::RawOutput;
use crate::types::task::{Task, TaskInput};

/// What a model produced when the session was recorded
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RecordedOutput {
    Output(RawOutput),
    Error { error: String },
}

/// Input plus per-model recorded outputs
#[derive(Debug, Clone, Deserialize)]
pub struct ReplaySession {
    pub input: TaskInput,
    pub outputs: HashMap<String, RecordedOutput>,
}

impl ReplaySession {
    /// Load a session from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read session {}", path.display()))?;
        Self::from_json(&data).with_context(|| format!("Invalid session {}", path.display()))
    }

    pub fn from_json(data: &str) -> Result<Self> {
        serde_json::from_str(data).context("Failed to parse session JSON")
    }

    pub fn task(&self) -> Task {
        self.input.task()
    }

    /// Build the replay predictor for a configured model.
    ///
    /// Only models of the session's task that have a recording can be built.
    pub fn predictor_for(&self, task: Task, spec: &ModelSpec) -> Result<Arc<dyn Predictor>> {
        if task != self.task() {
            anyhow::bail!("session records {} outputs, not {}", self.task(), task);
        }

        let recorded = self
            .outputs
            .get(&spec.name)
            .with_context(|| format!("no recorded output for {}", spec.name))?;

        let predictor = match recorded {
            RecordedOutput::Output(output) => ReplayPredictor::new(task, output.clone()),
            RecordedOutput::Error { error } => ReplayPredictor::failing(task, error.clone()),
        };
        Ok(Arc::new(predictor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelsConfig;
    use crate::models::registry::PredictorRegistry;
    use crate::types::prediction::PredictorId;
    use std::io::Write;

    const SESSION: &str = r#"{
        "input": { "kind": "text", "text": "What a great day" },
        "outputs": {
            "BERT": [{ "label": "5 stars", "score": 0.71 }],
            "RoBERTa": { "error": "CUDA out of memory" }
        }
    }"#;

    #[test]
    fn test_parse_session() {
        let session = ReplaySession::from_json(SESSION).unwrap();
        assert_eq!(session.task(), Task::Sentiment);
        assert!(matches!(session.outputs["BERT"], RecordedOutput::Output(_)));
        assert!(matches!(session.outputs["RoBERTa"], RecordedOutput::Error { .. }));
    }

    #[test]
    fn test_registry_from_session() {
        let session = ReplaySession::from_json(SESSION).unwrap();
        let registry = PredictorRegistry::from_config(&ModelsConfig::default(), |task, spec| {
            session.predictor_for(task, spec)
        });

        // DistilBERT has no recording and other tasks are not part of the session
        assert_eq!(
            registry.names(Task::Sentiment),
            vec![PredictorId::new("BERT"), PredictorId::new("RoBERTa")]
        );
        assert!(registry.predictors(Task::QuestionAnswering).is_empty());

        let failing = &registry.predictors(Task::Sentiment)[1];
        assert!(failing.predictor.predict(&session.input).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"input":{{"kind":"question_answering","question":"Capital?","context":"Brasilia is the capital"}},
               "outputs":{{"BERT-SQuAD":{{"answer":"Brasilia","score":0.93,"start":0,"end":8}}}}}}"#
        )
        .unwrap();

        let session = ReplaySession::load(file.path()).unwrap();
        assert_eq!(session.task(), Task::QuestionAnswering);
        match &session.outputs["BERT-SQuAD"] {
            RecordedOutput::Output(output) => assert_eq!(output.top().unwrap(), ("Brasilia", 0.93)),
            other => panic!("unexpected recording: {:?}", other),
        }
    }

    #[test]
    fn test_missing_file() {
        assert!(ReplaySession::load("/nonexistent/session.json").is_err());
    }
}
