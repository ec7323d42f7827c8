use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::ExamConfig;
use crate::model::{AnswerRecord, ExamResultId, Field, Question};
use crate::scoring::{is_passing, score};

/// Outcome of one completed timed exam. Never edited after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockExamResult {
    id: ExamResultId,
    date: DateTime<Utc>,
    score: u32,
    total_questions: u32,
    correct_answers: u32,
    time_spent_secs: u32,
    field_scores: BTreeMap<Field, u32>,
    passed: bool,
    answers: Vec<AnswerRecord>,
}

impl MockExamResult {
    /// Scores `answers` against the exam's questions and judges pass/fail.
    #[must_use]
    pub fn grade(
        id: ExamResultId,
        completed_at: DateTime<Utc>,
        questions: &[Question],
        answers: Vec<AnswerRecord>,
        time_spent_secs: u32,
        config: &ExamConfig,
    ) -> Self {
        let scored = score(&answers, questions, config);
        let passed = is_passing(scored.total, &scored.per_field, config);

        Self {
            id,
            date: completed_at,
            score: scored.total,
            total_questions: scored.question_count,
            correct_answers: scored.correct,
            time_spent_secs,
            field_scores: scored.per_field,
            passed,
            answers,
        }
    }

    #[must_use]
    pub fn id(&self) -> ExamResultId {
        self.id
    }

    #[must_use]
    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    /// Total score on the configured scale (0..=max score).
    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    #[must_use]
    pub fn time_spent_secs(&self) -> u32 {
        self.time_spent_secs
    }

    #[must_use]
    pub fn field_scores(&self) -> &BTreeMap<Field, u32> {
        &self.field_scores
    }

    #[must_use]
    pub fn field_score(&self, field: Field) -> u32 {
        self.field_scores.get(&field).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.passed
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }
}
