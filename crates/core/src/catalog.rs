use std::collections::HashMap;
use thiserror::Error;

use crate::model::{Field, Question, QuestionError, QuestionId};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate question id: {0}")]
    DuplicateId(QuestionId),

    #[error("invalid question {id}: {source}")]
    InvalidQuestion {
        id: QuestionId,
        #[source]
        source: QuestionError,
    },
}

/// Read-only question bank, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct QuestionCatalog {
    questions: Vec<Question>,
    index: HashMap<QuestionId, usize>,
}

impl QuestionCatalog {
    /// Build a catalog, rejecting invalid questions and duplicate ids.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidQuestion` or `CatalogError::DuplicateId`.
    pub fn from_questions(questions: Vec<Question>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(questions.len());
        for (pos, question) in questions.iter().enumerate() {
            question
                .validate()
                .map_err(|source| CatalogError::InvalidQuestion {
                    id: question.id().clone(),
                    source,
                })?;
            if index.insert(question.id().clone(), pos).is_some() {
                return Err(CatalogError::DuplicateId(question.id().clone()));
            }
        }
        Ok(Self { questions, index })
    }

    /// Parse a JSON array of questions.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Parse` for malformed JSON, or any validation error.
    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let questions: Vec<Question> = serde_json::from_str(raw)?;
        Self::from_questions(questions)
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &QuestionId) -> Option<&Question> {
        self.index.get(id).and_then(|pos| self.questions.get(*pos))
    }

    pub fn in_field(&self, field: Field) -> impl Iterator<Item = &Question> {
        self.questions.iter().filter(move |q| q.field() == field)
    }

    #[must_use]
    pub fn count_in_field(&self, field: Field) -> usize {
        self.in_field(field).count()
    }
}
