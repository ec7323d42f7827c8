use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::model::{AppState, Field, accuracy_percent};
use crate::scoring::scale_ratio;

/// Dashboard figures derived from the persisted state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyStats {
    pub total_study_minutes: u32,
    pub average_score: u32,
    pub best_score: u32,
    pub exams_taken: u32,
    pub exams_passed: u32,
    /// Accuracy over the whole free-study answer history, in percent.
    pub overall_accuracy: u32,
    pub streak_days: u32,
    pub weakest_field: Option<Field>,
    pub strongest_field: Option<Field>,
}

impl StudyStats {
    /// Compute stats as of `today` (UTC calendar date).
    #[must_use]
    pub fn compute(state: &AppState, today: NaiveDate) -> Self {
        let results = state.mock_exam_results();
        let exams_taken = u32::try_from(results.len()).unwrap_or(u32::MAX);
        let score_sum: u64 = results.iter().map(|r| u64::from(r.score())).sum();
        let average_score = if results.is_empty() {
            0
        } else {
            let count = results.len() as u64;
            u32::try_from((score_sum * 2 + count) / (2 * count)).unwrap_or(u32::MAX)
        };
        let best_score = results.iter().map(|r| r.score()).max().unwrap_or(0);
        let exams_passed = u32::try_from(results.iter().filter(|r| r.passed()).count())
            .unwrap_or(u32::MAX);

        let history = state.answer_history();
        let answered = u32::try_from(history.len()).unwrap_or(u32::MAX);
        let correct = u32::try_from(history.iter().filter(|a| a.is_correct).count())
            .unwrap_or(u32::MAX);

        let active_days: BTreeSet<NaiveDate> = history
            .iter()
            .map(|a| a.timestamp.date_naive())
            .chain(results.iter().map(|r| r.date().date_naive()))
            .collect();

        let (weakest_field, strongest_field) = field_extremes(state);

        Self {
            total_study_minutes: state.study_progress().study_time_minutes(),
            average_score,
            best_score,
            exams_taken,
            exams_passed,
            overall_accuracy: accuracy_percent(correct, answered),
            streak_days: streak(&active_days, today),
            weakest_field,
            strongest_field,
        }
    }

    /// Share of taken exams that passed, in percent.
    #[must_use]
    pub fn pass_rate(&self) -> u32 {
        scale_ratio(self.exams_passed, self.exams_taken, 100)
    }
}

/// Consecutive active days ending today, or ending yesterday if today has no activity yet.
fn streak(active_days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut day = if active_days.contains(&today) {
        today
    } else {
        match today.checked_sub_days(Days::new(1)) {
            Some(yesterday) if active_days.contains(&yesterday) => yesterday,
            _ => return 0,
        }
    };

    let mut count = 0;
    while active_days.contains(&day) {
        count += 1;
        match day.checked_sub_days(Days::new(1)) {
            Some(prev) => day = prev,
            None => break,
        }
    }
    count
}

/// Lowest and highest accuracy among fields with answers; ties go to the earlier field.
fn field_extremes(state: &AppState) -> (Option<Field>, Option<Field>) {
    let progress = state.study_progress();
    let mut weakest: Option<(Field, u32)> = None;
    let mut strongest: Option<(Field, u32)> = None;

    for field in Field::ALL {
        let fp = progress.field(field);
        if fp.answered_questions() == 0 {
            continue;
        }
        let accuracy = fp.accuracy();
        if weakest.is_none_or(|(_, lowest)| accuracy < lowest) {
            weakest = Some((field, accuracy));
        }
        if strongest.is_none_or(|(_, highest)| accuracy > highest) {
            strongest = Some((field, accuracy));
        }
    }

    (weakest.map(|(f, _)| f), strongest.map(|(f, _)| f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExamConfig;
    use crate::model::{AnswerRecord, ExamResultId, MockExamResult, Question, QuestionId};
    use crate::time::fixed_now;
    use chrono::Duration;

    fn question(id: &str, field: Field) -> Question {
        Question::new(
            QuestionId::new(id),
            field,
            "general",
            "?",
            vec!["a".into(), "b".into()],
            0,
            "",
        )
        .unwrap()
    }

    #[test]
    fn empty_state_has_zeroed_stats() {
        let stats = StudyStats::compute(&AppState::new(), fixed_now().date_naive());
        assert_eq!(stats.exams_taken, 0);
        assert_eq!(stats.average_score, 0);
        assert_eq!(stats.streak_days, 0);
        assert_eq!(stats.weakest_field, None);
        assert_eq!(stats.pass_rate(), 0);
    }

    #[test]
    fn exam_scores_are_summarized() {
        let mut state = AppState::new();
        let config = ExamConfig::standard();
        let qs = vec![
            question("st-1", Field::Strategy),
            question("ma-1", Field::Management),
            question("te-1", Field::Technology),
        ];
        for selected in [Some(0), None] {
            let answers = qs
                .iter()
                .map(|q| AnswerRecord::grade(q, selected, fixed_now(), 0))
                .collect();
            state.record_exam_result(MockExamResult::grade(
                ExamResultId::generate(),
                fixed_now(),
                &qs,
                answers,
                100,
                &config,
            ));
        }

        let stats = StudyStats::compute(&state, fixed_now().date_naive());
        assert_eq!(stats.exams_taken, 2);
        assert_eq!(stats.exams_passed, 1);
        assert_eq!(stats.best_score, 1000);
        assert_eq!(stats.average_score, 500);
        assert_eq!(stats.pass_rate(), 50);
        assert_eq!(stats.streak_days, 1);
    }

    #[test]
    fn streak_counts_back_from_yesterday() {
        let mut state = AppState::new();
        let q = question("te-1", Field::Technology);
        for days_ago in [1, 2, 3, 5] {
            let at = fixed_now() - Duration::days(days_ago);
            state.record_study_answer(AnswerRecord::grade(&q, Some(0), at, 0), &q);
        }

        let today = fixed_now().date_naive();
        assert_eq!(StudyStats::compute(&state, today).streak_days, 3);

        let later = today + Days::new(2);
        assert_eq!(StudyStats::compute(&state, later).streak_days, 0);
    }

    #[test]
    fn weakest_and_strongest_ignore_unanswered_fields() {
        let mut state = AppState::new();
        let st = question("st-1", Field::Strategy);
        let te = question("te-1", Field::Technology);
        state.record_study_answer(AnswerRecord::grade(&st, Some(1), fixed_now(), 0), &st);
        state.record_study_answer(AnswerRecord::grade(&te, Some(0), fixed_now(), 0), &te);

        let stats = StudyStats::compute(&state, fixed_now().date_naive());
        assert_eq!(stats.weakest_field, Some(Field::Strategy));
        assert_eq!(stats.strongest_field, Some(Field::Technology));
        assert_eq!(stats.overall_accuracy, 50);
    }
}
