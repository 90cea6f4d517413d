//! Committee tasks and their inputs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::CommitteeError;

/// Task a committee of predictors can be asked to solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Task {
    /// Text sentiment analysis
    Sentiment,
    /// Image classification
    ImageClassification,
    /// Extractive question answering
    QuestionAnswering,
}

impl Task {
    pub const ALL: [Task; 3] = [
        Task::Sentiment,
        Task::ImageClassification,
        Task::QuestionAnswering,
    ];

    /// Stable identifier, also used on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Task::Sentiment => "sentiment",
            Task::ImageClassification => "image-classification",
            Task::QuestionAnswering => "question-answering",
        }
    }

    /// Title used for the final answer line of a report
    pub fn outcome_title(&self) -> &'static str {
        match self {
            Task::Sentiment => "Sentiment",
            Task::ImageClassification => "Classification",
            Task::QuestionAnswering => "Answer",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Task {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sentiment" | "text" => Ok(Task::Sentiment),
            "image-classification" | "image" => Ok(Task::ImageClassification),
            "question-answering" | "qa" => Ok(Task::QuestionAnswering),
            other => Err(format!("unknown task: {}", other)),
        }
    }
}

/// Image handed to classification predictors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageInput {
    /// Image file on disk
    Path(PathBuf),
    /// Encoded image bytes
    Bytes(Vec<u8>),
}

/// Options forwarded to question-answering predictors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaOptions {
    /// Maximum answer length in tokens
    #[serde(default = "default_max_answer_len")]
    pub max_answer_len: usize,
    /// Allow the model to answer with an empty span
    #[serde(default = "default_handle_impossible_answer")]
    pub handle_impossible_answer: bool,
}

fn default_max_answer_len() -> usize {
    50
}

fn default_handle_impossible_answer() -> bool {
    true
}

impl Default for QaOptions {
    fn default() -> Self {
        Self {
            max_answer_len: default_max_answer_len(),
            handle_impossible_answer: default_handle_impossible_answer(),
        }
    }
}

/// Input shared by every predictor of a committee request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TaskInput {
    Text {
        text: String,
    },
    Image {
        image: ImageInput,
    },
    QuestionAnswering {
        question: String,
        context: String,
        #[serde(default)]
        options: QaOptions,
    },
}

impl TaskInput {
    pub fn text(text: impl Into<String>) -> Self {
        TaskInput::Text { text: text.into() }
    }

    pub fn image_path(path: impl Into<PathBuf>) -> Self {
        TaskInput::Image {
            image: ImageInput::Path(path.into()),
        }
    }

    pub fn question(question: impl Into<String>, context: impl Into<String>) -> Self {
        TaskInput::QuestionAnswering {
            question: question.into(),
            context: context.into(),
            options: QaOptions::default(),
        }
    }

    /// Replace the QA options (no-op for other inputs)
    pub fn with_qa_options(mut self, qa: QaOptions) -> Self {
        if let TaskInput::QuestionAnswering { options, .. } = &mut self {
            *options = qa;
        }
        self
    }

    /// Task this input belongs to
    pub fn task(&self) -> Task {
        match self {
            TaskInput::Text { .. } => Task::Sentiment,
            TaskInput::Image { .. } => Task::ImageClassification,
            TaskInput::QuestionAnswering { .. } => Task::QuestionAnswering,
        }
    }

    /// Reject inputs with nothing to analyse
    pub fn validate(&self) -> Result<(), CommitteeError> {
        let task = self.task();
        let reason = match self {
            TaskInput::Text { text } if text.is_empty() => Some("text is empty"),
            TaskInput::Image { image: ImageInput::Bytes(bytes) } if bytes.is_empty() => {
                Some("image is empty")
            }
            TaskInput::Image { image: ImageInput::Path(path) } if path.as_os_str().is_empty() => {
                Some("image path is empty")
            }
            TaskInput::QuestionAnswering { question, context, .. }
                if question.is_empty() || context.is_empty() =>
            {
                Some("both question and context are required")
            }
            _ => None,
        };

        match reason {
            Some(reason) => Err(CommitteeError::EmptyInput {
                task,
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_parsing() {
        assert_eq!("qa".parse::<Task>().unwrap(), Task::QuestionAnswering);
        assert_eq!("image".parse::<Task>().unwrap(), Task::ImageClassification);
        assert_eq!("sentiment".parse::<Task>().unwrap(), Task::Sentiment);
        assert!("audio".parse::<Task>().is_err());
    }

    #[test]
    fn test_input_validation() {
        assert!(TaskInput::text("great movie").validate().is_ok());
        assert!(matches!(
            TaskInput::text("").validate(),
            Err(CommitteeError::EmptyInput { task: Task::Sentiment, .. })
        ));
        // Only missing input is rejected; whitespace is left to the model
        assert!(TaskInput::text("   ").validate().is_ok());
        assert!(TaskInput::question("Who?", "").validate().is_err());
        assert!(TaskInput::question("", "Brasilia is the capital").validate().is_err());
        assert!(TaskInput::question("Capital?", "Brasilia is the capital")
            .validate()
            .is_ok());
        assert!(TaskInput::Image { image: ImageInput::Bytes(vec![]) }
            .validate()
            .is_err());
    }

    #[test]
    fn test_input_serialization() {
        let input = TaskInput::question("Capital?", "Brasilia");
        let json = serde_json::to_string(&input).unwrap();
        assert!(json.contains("\"kind\":\"question_answering\""));

        let parsed: TaskInput =
            serde_json::from_str(r#"{"kind":"question_answering","question":"q","context":"c"}"#)
                .unwrap();
        match parsed {
            TaskInput::QuestionAnswering { options, .. } => {
                assert_eq!(options.max_answer_len, 50);
                assert!(options.handle_impossible_answer);
            }
            other => panic!("unexpected input: {:?}", other),
        }
    }
}
