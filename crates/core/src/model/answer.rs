use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Question, QuestionId};

/// Record of a single answer submission.
///
/// `selected_answer` is `None` when the question was left unanswered (an exam
/// that ran out of time); such records are always incorrect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    pub selected_answer: Option<usize>,
    pub is_correct: bool,
    pub timestamp: DateTime<Utc>,
    pub time_spent_secs: u32,
}

impl AnswerRecord {
    /// Grades `selected` against `question` and records it.
    #[must_use]
    pub fn grade(
        question: &Question,
        selected: Option<usize>,
        answered_at: DateTime<Utc>,
        time_spent_secs: u32,
    ) -> Self {
        Self {
            question_id: question.id().clone(),
            selected_answer: selected,
            is_correct: question.is_correct(selected),
            timestamp: answered_at,
            time_spent_secs,
        }
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.selected_answer.is_some()
    }
}
