//! Predictor abstraction
//!
//! A predictor wraps one pretrained pipeline for one task. Inference itself
//! happens behind this trait; the committee only sees raw pipeline outputs.

use std::collections::HashMap;

use crate::error::PredictorError;
use crate::types::prediction::RawOutput;
use crate::types::task::{Task, TaskInput};

/// A pretrained model exposed as a single synchronous call.
pub trait Predictor: Send + Sync {
    /// Task this predictor serves
    fn task(&self) -> Task;

    /// Run the model on an input
    fn predict(&self, input: &TaskInput) -> Result<RawOutput, PredictorError>;
}

/// Recorded response of a replayed predictor
#[derive(Debug, Clone)]
enum Recording {
    Output(RawOutput),
    Error(String),
}

/// Predictor that answers with recorded pipeline outputs.
///
/// Recordings can be keyed by input text (the text, or the question for QA);
/// the fallback recording answers any other input. Used to run committees
/// without a model runtime.
#[derive(Debug, Clone)]
pub struct ReplayPredictor {
    task: Task,
    fallback: Option<Recording>,
    by_input: HashMap<String, Recording>,
}

impl ReplayPredictor {
    /// Predictor that always answers with `output`
    pub fn new(task: Task, output: RawOutput) -> Self {
        Self {
            task,
            fallback: Some(Recording::Output(output)),
            by_input: HashMap::new(),
        }
    }

    /// Predictor that always fails with `message`
    pub fn failing(task: Task, message: impl Into<String>) -> Self {
        Self {
            task,
            fallback: Some(Recording::Error(message.into())),
            by_input: HashMap::new(),
        }
    }

    /// Predictor with no fallback; only keyed recordings answer
    pub fn keyed(task: Task) -> Self {
        Self {
            task,
            fallback: None,
            by_input: HashMap::new(),
        }
    }

    /// Record an output for a specific input key
    pub fn with_output(mut self, key: impl Into<String>, output: RawOutput) -> Self {
        self.by_input.insert(key.into(), Recording::Output(output));
        self
    }

    fn input_key(input: &TaskInput) -> Option<&str> {
        match input {
            TaskInput::Text { text } => Some(text.as_str()),
            TaskInput::QuestionAnswering { question, .. } => Some(question.as_str()),
            TaskInput::Image { .. } => None,
        }
    }
}

impl Predictor for ReplayPredictor {
    fn task(&self) -> Task {
        self.task
    }

    fn predict(&self, input: &TaskInput) -> Result<RawOutput, PredictorError> {
        if input.task() != self.task {
            return Err(PredictorError::UnsupportedTask(input.task()));
        }

        let recording = Self::input_key(input)
            .and_then(|key| self.by_input.get(key))
            .or(self.fallback.as_ref());

        match recording {
            Some(Recording::Output(output)) => Ok(output.clone()),
            Some(Recording::Error(message)) => Err(PredictorError::Inference(message.clone())),
            None => Err(PredictorError::Inference(
                "no recorded output for this input".to_string(),
            )),
        }
    }
}
