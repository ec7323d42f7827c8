use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Field, QuestionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question id cannot be empty")]
    EmptyId,

    #[error("question must have at least one option")]
    NoOptions,

    #[error("correct answer index {index} is out of range for {options} options")]
    CorrectAnswerOutOfRange { index: usize, options: usize },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice question from the static catalog.
///
/// Questions are never mutated after load. Serialized keys follow the catalog's
/// JSON layout (`question`, `correctAnswer`, `keyPoints`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    id: QuestionId,
    field: Field,
    category: String,
    #[serde(rename = "question")]
    prompt: String,
    options: Vec<String>,
    correct_answer: usize,
    explanation: String,
    #[serde(default)]
    key_points: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    references: Option<Vec<String>>,
}

impl Question {
    /// Creates a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the id is blank, there are no options, or the
    /// correct index does not point at an option.
    pub fn new(
        id: QuestionId,
        field: Field,
        category: impl Into<String>,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_answer: usize,
        explanation: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let question = Self {
            id,
            field,
            category: category.into(),
            prompt: prompt.into(),
            options,
            correct_answer,
            explanation: explanation.into(),
            key_points: Vec::new(),
            references: None,
        };
        question.validate()?;
        Ok(question)
    }

    #[must_use]
    pub fn with_key_points(mut self, key_points: Vec<String>) -> Self {
        self.key_points = key_points;
        self
    }

    #[must_use]
    pub fn with_references(mut self, references: Vec<String>) -> Self {
        self.references = Some(references);
        self
    }

    /// Checks the invariants `new` enforces; used for deserialized questions.
    ///
    /// # Errors
    ///
    /// Returns the first violated `QuestionError`.
    pub fn validate(&self) -> Result<(), QuestionError> {
        if self.id.as_str().trim().is_empty() {
            return Err(QuestionError::EmptyId);
        }
        if self.options.is_empty() {
            return Err(QuestionError::NoOptions);
        }
        if self.correct_answer >= self.options.len() {
            return Err(QuestionError::CorrectAnswerOutOfRange {
                index: self.correct_answer,
                options: self.options.len(),
            });
        }
        Ok(())
    }

    /// Returns true if `selected` is the correct option. `None` never matches.
    #[must_use]
    pub fn is_correct(&self, selected: Option<usize>) -> bool {
        selected == Some(self.correct_answer)
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn field(&self) -> Field {
        self.field
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> usize {
        self.correct_answer
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn key_points(&self) -> &[String] {
        &self.key_points
    }

    #[must_use]
    pub fn references(&self) -> Option<&[String]> {
        self.references.as_deref()
    }
}
