use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;

use exam_core::model::{Field, Question};
use exam_core::{ExamConfig, QuestionCatalog};

/// Configured quota for a field next to what the catalog can supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaFill {
    pub quota: u32,
    pub available: u32,
}

impl QuotaFill {
    /// Questions the field contributes to an exam.
    #[must_use]
    pub fn selected(&self) -> u32 {
        self.quota.min(self.available)
    }

    #[must_use]
    pub fn is_short(&self) -> bool {
        self.available < self.quota
    }
}

/// Questions drawn for one mock exam.
#[derive(Debug, Clone, PartialEq)]
pub struct ExamPlan {
    pub questions: Vec<Question>,
    pub fills: BTreeMap<Field, QuotaFill>,
}

impl ExamPlan {
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// True when at least one field could not meet its quota.
    #[must_use]
    pub fn is_short(&self) -> bool {
        self.fills.values().any(QuotaFill::is_short)
    }
}

/// Draws a stratified exam from the catalog according to the configured quotas.
pub struct ExamBuilder<'a> {
    catalog: &'a QuestionCatalog,
    config: &'a ExamConfig,
}

impl<'a> ExamBuilder<'a> {
    #[must_use]
    pub fn new(catalog: &'a QuestionCatalog, config: &'a ExamConfig) -> Self {
        Self { catalog, config }
    }

    /// Quota versus availability for every field.
    #[must_use]
    pub fn quota_report(&self) -> BTreeMap<Field, QuotaFill> {
        Field::ALL
            .into_iter()
            .map(|field| {
                let available =
                    u32::try_from(self.catalog.count_in_field(field)).unwrap_or(u32::MAX);
                let fill = QuotaFill {
                    quota: self.config.quota(field),
                    available,
                };
                (field, fill)
            })
            .collect()
    }

    /// Build an exam plan.
    ///
    /// - Each field contributes `min(quota, available)` questions drawn uniformly
    ///   without replacement.
    /// - The combined set is shuffled again so field order is not observable.
    /// - A field short of its quota shortens the exam; nothing is borrowed from
    ///   other fields.
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> ExamPlan {
        let fills = self.quota_report();
        let mut questions = Vec::with_capacity(
            usize::try_from(self.config.total_questions()).unwrap_or_default(),
        );

        for (field, fill) in &fills {
            if fill.is_short() {
                tracing::debug!(
                    field = %field,
                    quota = fill.quota,
                    available = fill.available,
                    "field under-filled, exam will be shorter"
                );
            }
            let mut pool: Vec<&Question> = self.catalog.in_field(*field).collect();
            pool.shuffle(rng);
            let take = usize::try_from(fill.selected()).unwrap_or(usize::MAX);
            questions.extend(pool.into_iter().take(take).cloned());
        }

        questions.shuffle(rng);
        ExamPlan { questions, fills }
    }
}

/// Every question of `field`, freshly shuffled, for untimed practice.
pub fn sample_for_study<R: Rng + ?Sized>(
    catalog: &QuestionCatalog,
    field: Field,
    rng: &mut R,
) -> Vec<Question> {
    let mut questions: Vec<Question> = catalog.in_field(field).cloned().collect();
    questions.shuffle(rng);
    questions
}
