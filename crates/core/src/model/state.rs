use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{AnswerRecord, Field, MockExamResult, Question, StudyProgress};

/// The persisted learner document: study aggregate, answer history and exam results.
///
/// Missing keys deserialize to their empty values so older or partial documents
/// still load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppState {
    study_progress: StudyProgress,
    answer_history: Vec<AnswerRecord>,
    mock_exam_results: Vec<MockExamResult>,
}

impl AppState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn study_progress(&self) -> &StudyProgress {
        &self.study_progress
    }

    #[must_use]
    pub fn answer_history(&self) -> &[AnswerRecord] {
        &self.answer_history
    }

    #[must_use]
    pub fn mock_exam_results(&self) -> &[MockExamResult] {
        &self.mock_exam_results
    }

    #[must_use]
    pub fn latest_exam_result(&self) -> Option<&MockExamResult> {
        self.mock_exam_results.last()
    }

    pub fn record_presented(&mut self, field: Field) {
        self.study_progress.apply_presented(field);
    }

    /// Appends a free-study answer to the history and folds it into the aggregate.
    pub fn record_study_answer(&mut self, record: AnswerRecord, question: &Question) {
        self.study_progress.apply_answer(&record, question);
        self.answer_history.push(record);
    }

    pub fn record_session_end(&mut self, started_at: Option<DateTime<Utc>>, now: DateTime<Utc>) {
        self.study_progress.apply_session_end(started_at, now);
    }

    /// Appends a completed exam. Exam answers stay inside the result.
    pub fn record_exam_result(&mut self, result: MockExamResult) {
        self.mock_exam_results.push(result);
    }
}
