use chrono::{DateTime, Utc};

use exam_core::model::{AnswerRecord, Field, Question};

use crate::error::PreconditionError;

/// Totals for a finished study session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudySummary {
    pub field: Field,
    pub answered: u32,
    pub correct: u32,
    pub minutes: u32,
}

/// Untimed practice over one field's shuffled questions.
///
/// Each presentation of a question accepts one answer. Moving back to a
/// question presents it again, so it can be answered again.
#[derive(Debug, Clone)]
pub struct StudySession {
    field: Field,
    started_at: DateTime<Utc>,
    deck: Vec<Question>,
    cursor: usize,
    presented_at: DateTime<Utc>,
    current_answer: Option<AnswerRecord>,
    answered: u32,
    correct: u32,
}

impl StudySession {
    /// Start a session over `deck`, presenting its first question.
    ///
    /// # Errors
    ///
    /// Returns `PreconditionError::NoQuestionsInField` when `deck` is empty.
    pub fn new(
        field: Field,
        deck: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, PreconditionError> {
        if deck.is_empty() {
            return Err(PreconditionError::NoQuestionsInField(field));
        }
        Ok(Self {
            field,
            started_at,
            deck,
            cursor: 0,
            presented_at: started_at,
            current_answer: None,
            answered: 0,
            correct: 0,
        })
    }

    #[must_use]
    pub fn field(&self) -> Field {
        self.field
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.deck.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deck.is_empty()
    }

    /// Zero-based position of the presented question.
    #[must_use]
    pub fn position(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.deck.get(self.cursor)
    }

    /// The answer given to the current presentation, if any.
    #[must_use]
    pub fn current_answer(&self) -> Option<&AnswerRecord> {
        self.current_answer.as_ref()
    }

    #[must_use]
    pub fn answered_count(&self) -> u32 {
        self.answered
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.cursor + 1 < self.deck.len()
    }

    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.cursor > 0
    }

    /// Answer the presented question.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyAnswered` if this presentation was answered,
    /// `OptionOutOfRange` for an invalid option, or `NoCurrentQuestion` if
    /// nothing is presented.
    pub fn answer(
        &mut self,
        index: usize,
        now: DateTime<Utc>,
    ) -> Result<AnswerRecord, PreconditionError> {
        if self.current_answer.is_some() {
            return Err(PreconditionError::AlreadyAnswered);
        }
        let question = self
            .deck
            .get(self.cursor)
            .ok_or(PreconditionError::NoCurrentQuestion)?;
        let options = question.options().len();
        if index >= options {
            return Err(PreconditionError::OptionOutOfRange { index, options });
        }

        let spent = (now - self.presented_at).num_seconds().max(0);
        let record = AnswerRecord::grade(
            question,
            Some(index),
            now,
            u32::try_from(spent).unwrap_or(u32::MAX),
        );
        self.answered += 1;
        if record.is_correct {
            self.correct += 1;
        }
        self.current_answer = Some(record.clone());
        Ok(record)
    }

    /// Present the next question. False when already at the last one.
    pub fn advance(&mut self, now: DateTime<Utc>) -> bool {
        if !self.has_next() {
            return false;
        }
        self.present(self.cursor + 1, now);
        true
    }

    /// Present the previous question. False when already at the first one.
    pub fn retreat(&mut self, now: DateTime<Utc>) -> bool {
        if !self.has_previous() {
            return false;
        }
        self.present(self.cursor - 1, now);
        true
    }

    fn present(&mut self, cursor: usize, now: DateTime<Utc>) {
        self.cursor = cursor;
        self.presented_at = now;
        self.current_answer = None;
    }

    #[must_use]
    pub fn summary(&self, ended_at: DateTime<Utc>) -> StudySummary {
        let minutes = (ended_at - self.started_at).num_minutes().max(0);
        StudySummary {
            field: self.field,
            answered: self.answered,
            correct: self.correct,
            minutes: u32::try_from(minutes).unwrap_or(u32::MAX),
        }
    }
}
