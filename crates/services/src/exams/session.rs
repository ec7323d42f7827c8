use chrono::{DateTime, Utc};
use std::collections::HashMap;

use exam_core::ExamConfig;
use exam_core::model::{AnswerRecord, ExamResultId, MockExamResult, Question, QuestionId};
use exam_core::timer::{Countdown, ExamTimer, TimerEvent};

use crate::error::PreconditionError;

/// The learner's current pick for one exam question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Selection {
    index: usize,
    answered_at: DateTime<Utc>,
    time_spent_secs: u32,
}

//
// ─── MOCK EXAM ─────────────────────────────────────────────────────────────────
//

/// One timed exam attempt.
///
/// Answers can be changed until the timer stops; records are only materialized
/// when the exam is graded, in question order.
#[derive(Debug, Clone)]
pub struct MockExam {
    attempt: u64,
    questions: Vec<Question>,
    selections: HashMap<QuestionId, Selection>,
    timer: ExamTimer,
    current: usize,
    started_at: DateTime<Utc>,
    last_interaction: DateTime<Utc>,
}

impl MockExam {
    /// Start attempt `attempt` over `questions` with a running timer.
    ///
    /// # Errors
    ///
    /// Returns `PreconditionError::EmptyExam` when there are no questions, or
    /// `PreconditionError::Timer` if the timer cannot start.
    pub fn start(
        attempt: u64,
        questions: Vec<Question>,
        config: &ExamConfig,
        now: DateTime<Utc>,
    ) -> Result<Self, PreconditionError> {
        if questions.is_empty() {
            return Err(PreconditionError::EmptyExam);
        }
        let mut timer = ExamTimer::from_config(config);
        timer.start_minutes(config.time_limit_minutes())?;

        Ok(Self {
            attempt,
            selections: HashMap::with_capacity(questions.len()),
            questions,
            timer,
            current: 0,
            started_at: now,
            last_interaction: now,
        })
    }

    #[must_use]
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    /// Jump to the question at `index`.
    ///
    /// # Errors
    ///
    /// Returns `PreconditionError::QuestionIndexOutOfRange` for an index past the end.
    pub fn go_to(&mut self, index: usize) -> Result<&Question, PreconditionError> {
        let len = self.questions.len();
        let question = self
            .questions
            .get(index)
            .ok_or(PreconditionError::QuestionIndexOutOfRange { index, len })?;
        self.current = index;
        Ok(question)
    }

    /// Record or replace the selection for `question_id`.
    ///
    /// Time spent is measured from the previous answer, or from the start.
    ///
    /// # Errors
    ///
    /// Returns `PreconditionError::NoActiveExam` once the timer has stopped,
    /// `UnknownExamQuestion` for a question outside this exam, or
    /// `OptionOutOfRange` for an invalid option.
    pub fn answer(
        &mut self,
        question_id: &QuestionId,
        index: usize,
        now: DateTime<Utc>,
    ) -> Result<(), PreconditionError> {
        if !self.timer.is_running() {
            return Err(PreconditionError::NoActiveExam);
        }
        let question = self
            .questions
            .iter()
            .find(|q| q.id() == question_id)
            .ok_or_else(|| PreconditionError::UnknownExamQuestion(question_id.clone()))?;
        let options = question.options().len();
        if index >= options {
            return Err(PreconditionError::OptionOutOfRange { index, options });
        }

        let spent = (now - self.last_interaction).num_seconds().max(0);
        self.selections.insert(question_id.clone(), Selection {
            index,
            answered_at: now,
            time_spent_secs: u32::try_from(spent).unwrap_or(u32::MAX),
        });
        self.last_interaction = now;
        Ok(())
    }

    #[must_use]
    pub fn selection(&self, question_id: &QuestionId) -> Option<usize> {
        self.selections.get(question_id).map(|s| s.index)
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.selections.len()
    }

    /// Questions without a selection, in exam order.
    #[must_use]
    pub fn unanswered(&self) -> Vec<&QuestionId> {
        self.questions
            .iter()
            .map(Question::id)
            .filter(|id| !self.selections.contains_key(*id))
            .collect()
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        self.timer.tick()
    }

    /// Stop the countdown at the learner's request. False if it already stopped.
    pub fn finish(&mut self) -> bool {
        self.timer.finish()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.timer.is_running()
    }

    #[must_use]
    pub fn countdown(&self) -> Countdown {
        self.timer.countdown()
    }

    /// Score the attempt. Unanswered questions are recorded with no selection.
    #[must_use]
    pub fn grade(
        &self,
        id: ExamResultId,
        completed_at: DateTime<Utc>,
        config: &ExamConfig,
    ) -> MockExamResult {
        let answers = self
            .questions
            .iter()
            .map(|question| match self.selections.get(question.id()) {
                Some(sel) => AnswerRecord::grade(
                    question,
                    Some(sel.index),
                    sel.answered_at,
                    sel.time_spent_secs,
                ),
                None => AnswerRecord::grade(question, None, completed_at, 0),
            })
            .collect();

        MockExamResult::grade(
            id,
            completed_at,
            &self.questions,
            answers,
            self.timer.elapsed_secs(),
            config,
        )
    }
}
