use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{AnswerRecord, Field, Question};
use crate::scoring::scale_ratio;

/// Fields and categories below this accuracy (percent) are reported as weak.
pub const WEAK_ACCURACY_THRESHOLD: u32 = 70;

static EMPTY_FIELD_PROGRESS: FieldProgress = FieldProgress {
    total_questions: 0,
    answered_questions: 0,
    correct_answers: 0,
    accuracy: 0,
    weak_categories: Vec::new(),
    categories: BTreeMap::new(),
};

/// Rounded accuracy percentage; 0 when nothing was answered.
#[must_use]
pub fn accuracy_percent(correct: u32, answered: u32) -> u32 {
    scale_ratio(correct, answered, 100)
}

//
// ─── CATEGORY TALLY ────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTally {
    pub answered: u32,
    pub correct: u32,
}

impl CategoryTally {
    #[must_use]
    pub fn accuracy(&self) -> u32 {
        accuracy_percent(self.correct, self.answered)
    }

    #[must_use]
    pub fn is_weak(&self) -> bool {
        self.answered > 0 && self.accuracy() < WEAK_ACCURACY_THRESHOLD
    }
}

//
// ─── FIELD PROGRESS ────────────────────────────────────────────────────────────
//

/// Cumulative free-study counters for one field.
///
/// Invariant: `correct_answers <= answered_questions <= total_questions`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldProgress {
    total_questions: u32,
    answered_questions: u32,
    correct_answers: u32,
    accuracy: u32,
    weak_categories: Vec<String>,
    #[serde(default)]
    categories: BTreeMap<String, CategoryTally>,
}

impl FieldProgress {
    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn answered_questions(&self) -> u32 {
        self.answered_questions
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    #[must_use]
    pub fn accuracy(&self) -> u32 {
        self.accuracy
    }

    /// Categories with at least one answer and accuracy below the weak threshold, sorted.
    #[must_use]
    pub fn weak_categories(&self) -> &[String] {
        &self.weak_categories
    }

    #[must_use]
    pub fn category(&self, name: &str) -> Option<&CategoryTally> {
        self.categories.get(name)
    }

    #[must_use]
    pub fn is_weak(&self) -> bool {
        self.answered_questions > 0 && self.accuracy < WEAK_ACCURACY_THRESHOLD
    }

    fn present(&mut self) {
        self.total_questions = self.total_questions.saturating_add(1);
    }

    fn record(&mut self, category: &str, is_correct: bool) {
        self.answered_questions = self.answered_questions.saturating_add(1);
        if is_correct {
            self.correct_answers = self.correct_answers.saturating_add(1);
        }
        self.total_questions = self.total_questions.max(self.answered_questions);
        self.accuracy = accuracy_percent(self.correct_answers, self.answered_questions);

        let tally = self.categories.entry(category.to_owned()).or_default();
        tally.answered = tally.answered.saturating_add(1);
        if is_correct {
            tally.correct = tally.correct.saturating_add(1);
        }
        let weak = tally.is_weak();

        match (weak, self.weak_categories.binary_search_by(|c| c.as_str().cmp(category))) {
            (true, Err(pos)) => self.weak_categories.insert(pos, category.to_owned()),
            (false, Ok(pos)) => {
                self.weak_categories.remove(pos);
            }
            _ => {}
        }
    }
}

//
// ─── STUDY PROGRESS ────────────────────────────────────────────────────────────
//

/// Durable aggregate of free-study statistics.
///
/// Updated one event at a time; nothing here is ever recomputed from the
/// answer history. Mock-exam answers are deliberately not folded in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyProgress {
    total_questions: u32,
    answered_questions: u32,
    correct_answers: u32,
    field_progress: BTreeMap<Field, FieldProgress>,
    /// Cumulative minutes.
    study_time: u32,
    last_studied: Option<DateTime<Utc>>,
}

impl Default for StudyProgress {
    fn default() -> Self {
        Self {
            total_questions: 0,
            answered_questions: 0,
            correct_answers: 0,
            field_progress: Field::ALL
                .into_iter()
                .map(|field| (field, FieldProgress::default()))
                .collect(),
            study_time: 0,
            last_studied: None,
        }
    }
}

impl StudyProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn answered_questions(&self) -> u32 {
        self.answered_questions
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    #[must_use]
    pub fn study_time_minutes(&self) -> u32 {
        self.study_time
    }

    #[must_use]
    pub fn last_studied(&self) -> Option<DateTime<Utc>> {
        self.last_studied
    }

    #[must_use]
    pub fn field(&self, field: Field) -> &FieldProgress {
        self.field_progress
            .get(&field)
            .unwrap_or(&EMPTY_FIELD_PROGRESS)
    }

    /// Overall free-study accuracy in percent.
    #[must_use]
    pub fn accuracy(&self) -> u32 {
        accuracy_percent(self.correct_answers, self.answered_questions)
    }

    /// Counts a question shown to the learner in free study.
    pub fn apply_presented(&mut self, field: Field) {
        self.total_questions = self.total_questions.saturating_add(1);
        self.field_progress.entry(field).or_default().present();
    }

    /// Folds one free-study answer into the aggregate.
    ///
    /// The question supplies the field and category; correctness comes from the record.
    /// Study time is not touched.
    pub fn apply_answer(&mut self, record: &AnswerRecord, question: &Question) {
        self.answered_questions = self.answered_questions.saturating_add(1);
        if record.is_correct {
            self.correct_answers = self.correct_answers.saturating_add(1);
        }
        self.total_questions = self.total_questions.max(self.answered_questions);

        self.field_progress
            .entry(question.field())
            .or_default()
            .record(question.category(), record.is_correct);
        self.last_studied = Some(record.timestamp);
    }

    /// Adds whole elapsed minutes of a study session to the cumulative study time.
    ///
    /// No session (`None`) or a start in the future adds nothing.
    pub fn apply_session_end(&mut self, session_start: Option<DateTime<Utc>>, now: DateTime<Utc>) {
        let Some(start) = session_start else {
            return;
        };
        let minutes = now.signed_duration_since(start).num_minutes().max(0);
        let minutes = u32::try_from(minutes).unwrap_or(u32::MAX);
        self.study_time = self.study_time.saturating_add(minutes);
    }

    /// Fields with at least one answer and accuracy below the weak threshold.
    #[must_use]
    pub fn weak_fields(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|field| self.field(*field).is_weak())
            .collect()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionId;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn question(id: &str, field: Field, category: &str) -> Question {
        Question::new(
            QuestionId::new(id),
            field,
            category,
            "?",
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            0,
            "",
        )
        .unwrap()
    }

    fn answer(q: &Question, selected: usize) -> AnswerRecord {
        AnswerRecord::grade(q, Some(selected), fixed_now(), 5)
    }

    fn assert_counter_invariants(progress: &StudyProgress) {
        let mut answered = 0;
        for field in Field::ALL {
            let fp = progress.field(field);
            assert!(fp.correct_answers() <= fp.answered_questions());
            assert!(fp.answered_questions() <= fp.total_questions());
            answered += fp.answered_questions();
        }
        assert_eq!(progress.answered_questions(), answered);
    }

    #[test]
    fn default_has_every_field_zeroed() {
        let progress = StudyProgress::new();
        for field in Field::ALL {
            assert_eq!(progress.field(field), &FieldProgress::default());
        }
        assert!(progress.weak_fields().is_empty());
    }

    #[test]
    fn apply_answer_updates_field_and_global_counters() {
        let mut progress = StudyProgress::new();
        let q = question("st-1", Field::Strategy, "law");

        progress.apply_presented(Field::Strategy);
        progress.apply_answer(&answer(&q, 0), &q);
        progress.apply_answer(&answer(&q, 2), &q);
        progress.apply_answer(&answer(&q, 0), &q);

        let fp = progress.field(Field::Strategy);
        assert_eq!(fp.answered_questions(), 3);
        assert_eq!(fp.correct_answers(), 2);
        assert_eq!(fp.accuracy(), 67);
        assert_eq!(progress.answered_questions(), 3);
        assert_eq!(progress.correct_answers(), 2);
        assert_eq!(progress.last_studied(), Some(fixed_now()));
        assert_eq!(progress.study_time_minutes(), 0);
        assert_counter_invariants(&progress);
    }

    #[test]
    fn folding_in_sequence_matches_step_by_step() {
        let a = question("te-1", Field::Technology, "network");
        let b = question("ma-1", Field::Management, "project");
        let events = [(answer(&a, 0), &a), (answer(&b, 3), &b), (answer(&a, 1), &a)];

        let folded = events.iter().fold(StudyProgress::new(), |mut acc, (rec, q)| {
            acc.apply_answer(rec, q);
            acc
        });

        let mut stepwise = StudyProgress::new();
        stepwise.apply_answer(&events[0].0, events[0].1);
        stepwise.apply_answer(&events[1].0, events[1].1);
        stepwise.apply_answer(&events[2].0, events[2].1);

        assert_eq!(folded, stepwise);
        assert_eq!(folded.field(Field::Technology).accuracy(), 50);
        assert_counter_invariants(&folded);
    }

    #[test]
    fn weak_fields_require_answers_and_low_accuracy() {
        let mut progress = StudyProgress::new();
        let st = question("st-1", Field::Strategy, "law");
        let te = question("te-1", Field::Technology, "security");

        progress.apply_answer(&answer(&st, 1), &st);
        for _ in 0..3 {
            progress.apply_answer(&answer(&te, 0), &te);
        }

        assert_eq!(progress.weak_fields(), vec![Field::Strategy]);
    }

    #[test]
    fn weak_categories_follow_category_accuracy() {
        let mut progress = StudyProgress::new();
        let law = question("st-1", Field::Strategy, "law");
        let accounting = question("st-2", Field::Strategy, "accounting");

        progress.apply_answer(&answer(&law, 1), &law);
        progress.apply_answer(&answer(&accounting, 1), &accounting);
        assert_eq!(
            progress.field(Field::Strategy).weak_categories(),
            ["accounting".to_string(), "law".to_string()]
        );

        for _ in 0..3 {
            progress.apply_answer(&answer(&law, 0), &law);
        }
        assert_eq!(
            progress.field(Field::Strategy).weak_categories(),
            ["accounting".to_string()]
        );
        assert_eq!(
            progress.field(Field::Strategy).category("law"),
            Some(&CategoryTally {
                answered: 4,
                correct: 3
            })
        );
    }

    #[test]
    fn session_end_adds_floored_minutes() {
        let mut progress = StudyProgress::new();
        let start = fixed_now();

        progress.apply_session_end(Some(start), start + Duration::seconds(179));
        assert_eq!(progress.study_time_minutes(), 2);

        progress.apply_session_end(None, start + Duration::hours(5));
        assert_eq!(progress.study_time_minutes(), 2);

        progress.apply_session_end(Some(start), start - Duration::minutes(10));
        assert_eq!(progress.study_time_minutes(), 2);
    }

    #[test]
    fn round_trips_through_json() {
        let mut progress = StudyProgress::new();
        let q = question("ma-1", Field::Management, "service");
        progress.apply_presented(Field::Management);
        progress.apply_answer(&answer(&q, 2), &q);
        progress.apply_session_end(Some(fixed_now()), fixed_now() + Duration::minutes(12));

        let json = serde_json::to_string(&progress).unwrap();
        let back: StudyProgress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, progress);
    }
}
