//! Exam scoring and the pass/fail rule.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::ExamConfig;
use crate::model::{AnswerRecord, Field, Question, QuestionId};

/// `round(part / whole * scale)` with halves rounded up; 0 when `whole` is 0.
#[must_use]
pub fn scale_ratio(part: u32, whole: u32, scale: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    let whole = u64::from(whole);
    let scaled = (u64::from(part) * u64::from(scale) * 2 + whole) / (2 * whole);
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

/// Total and per-field scores for one exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamScore {
    pub total: u32,
    /// Every field is present; a field with no questions scores 0.
    pub per_field: BTreeMap<Field, u32>,
    pub correct: u32,
    pub question_count: u32,
}

/// Scores `answers` against the exam's `questions`.
///
/// Each field is scored against its own question count. Answers to questions
/// outside the exam are ignored, and only the first answer per question counts.
#[must_use]
pub fn score(answers: &[AnswerRecord], questions: &[Question], config: &ExamConfig) -> ExamScore {
    let max_score = config.max_score();
    let field_of: HashMap<&QuestionId, Field> =
        questions.iter().map(|q| (q.id(), q.field())).collect();

    let mut field_totals: BTreeMap<Field, u32> = BTreeMap::new();
    for question in questions {
        *field_totals.entry(question.field()).or_default() += 1;
    }

    let mut counted: HashSet<&QuestionId> = HashSet::with_capacity(answers.len());
    let mut field_correct: BTreeMap<Field, u32> = BTreeMap::new();
    let mut correct = 0_u32;
    for answer in answers {
        let Some(field) = field_of.get(&answer.question_id) else {
            continue;
        };
        if !counted.insert(&answer.question_id) {
            continue;
        }
        if answer.is_correct {
            correct += 1;
            *field_correct.entry(*field).or_default() += 1;
        }
    }

    let question_count = u32::try_from(questions.len()).unwrap_or(u32::MAX);
    let per_field = Field::ALL
        .into_iter()
        .map(|field| {
            let total = field_totals.get(&field).copied().unwrap_or(0);
            let right = field_correct.get(&field).copied().unwrap_or(0);
            (field, scale_ratio(right, total, max_score))
        })
        .collect();

    ExamScore {
        total: scale_ratio(correct, question_count, max_score),
        per_field,
        correct,
        question_count,
    }
}

/// Pass iff the total clears the overall bar AND every field clears its own bar.
///
/// A field absent from `per_field` counts as 0.
#[must_use]
pub fn is_passing(total: u32, per_field: &BTreeMap<Field, u32>, config: &ExamConfig) -> bool {
    let total_passed = total >= config.passing_score();
    let fields_passed = Field::ALL.into_iter().all(|field| {
        per_field.get(&field).copied().unwrap_or(0) >= config.field_passing_score(field)
    });
    total_passed && fields_passed
}
