use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::Field;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("missing question quota for field {0}")]
    MissingQuota(Field),

    #[error("missing passing score for field {0}")]
    MissingFieldPassingScore(Field),

    #[error("exam must contain at least one question")]
    EmptyExam,

    #[error("max score must be > 0")]
    InvalidMaxScore,

    #[error("passing score {score} exceeds max score {max}")]
    PassingScoreAboveMax { score: u32, max: u32 },

    #[error("time limit must be > 0 minutes")]
    InvalidTimeLimit,

    #[error("critical threshold ({critical}s) must not exceed warning threshold ({warning}s)")]
    InvalidAlertThresholds { warning: u32, critical: u32 },

    #[error("invalid exam config document: {0}")]
    Parse(String),
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated exam configuration, as read from a config document.
///
/// Missing keys take the standard certification values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExamConfigDraft {
    pub field_quotas: BTreeMap<Field, u32>,
    pub time_limit_minutes: u32,
    pub max_score: u32,
    pub passing_score: u32,
    pub field_passing_scores: BTreeMap<Field, u32>,
    pub warning_threshold_secs: u32,
    pub critical_threshold_secs: u32,
}

impl Default for ExamConfigDraft {
    fn default() -> Self {
        ExamConfig::standard().to_draft()
    }
}

impl ExamConfigDraft {
    /// Validate the draft into an `ExamConfig`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a field has no quota or passing score, the exam
    /// would be empty, a passing score exceeds the max score, the time limit is
    /// zero, or the alert thresholds are inverted.
    pub fn validate(self) -> Result<ExamConfig, ConfigError> {
        for field in Field::ALL {
            if !self.field_quotas.contains_key(&field) {
                return Err(ConfigError::MissingQuota(field));
            }
            if !self.field_passing_scores.contains_key(&field) {
                return Err(ConfigError::MissingFieldPassingScore(field));
            }
        }
        if self.field_quotas.values().all(|quota| *quota == 0) {
            return Err(ConfigError::EmptyExam);
        }
        if self.max_score == 0 {
            return Err(ConfigError::InvalidMaxScore);
        }
        let highest_passing = self
            .field_passing_scores
            .values()
            .copied()
            .chain(std::iter::once(self.passing_score))
            .max()
            .unwrap_or(0);
        if highest_passing > self.max_score {
            return Err(ConfigError::PassingScoreAboveMax {
                score: highest_passing,
                max: self.max_score,
            });
        }
        if self.time_limit_minutes == 0 {
            return Err(ConfigError::InvalidTimeLimit);
        }
        if self.critical_threshold_secs > self.warning_threshold_secs {
            return Err(ConfigError::InvalidAlertThresholds {
                warning: self.warning_threshold_secs,
                critical: self.critical_threshold_secs,
            });
        }

        Ok(ExamConfig {
            field_quotas: self.field_quotas,
            time_limit_minutes: self.time_limit_minutes,
            max_score: self.max_score,
            passing_score: self.passing_score,
            field_passing_scores: self.field_passing_scores,
            warning_threshold_secs: self.warning_threshold_secs,
            critical_threshold_secs: self.critical_threshold_secs,
        })
    }
}

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

/// Composition, timing and pass rules of a mock exam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamConfig {
    field_quotas: BTreeMap<Field, u32>,
    time_limit_minutes: u32,
    max_score: u32,
    passing_score: u32,
    field_passing_scores: BTreeMap<Field, u32>,
    warning_threshold_secs: u32,
    critical_threshold_secs: u32,
}

impl Default for ExamConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl ExamConfig {
    /// The certification's published format:
    /// - 100 questions: strategy 35, management 20, technology 45
    /// - 165 minutes
    /// - 1000-point scale; pass at 600 overall and 300 in every field
    /// - warning at 30 minutes left, critical at 10
    #[must_use]
    pub fn standard() -> Self {
        let field_quotas = BTreeMap::from([
            (Field::Strategy, 35),
            (Field::Management, 20),
            (Field::Technology, 45),
        ]);
        let field_passing_scores = Field::ALL.into_iter().map(|field| (field, 300)).collect();

        Self {
            field_quotas,
            time_limit_minutes: 165,
            max_score: 1000,
            passing_score: 600,
            field_passing_scores,
            warning_threshold_secs: 1800,
            critical_threshold_secs: 600,
        }
    }

    /// Parse and validate a JSON config document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed JSON, or any validation error.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let draft: ExamConfigDraft =
            serde_json::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        draft.validate()
    }

    #[must_use]
    pub fn to_draft(&self) -> ExamConfigDraft {
        ExamConfigDraft {
            field_quotas: self.field_quotas.clone(),
            time_limit_minutes: self.time_limit_minutes,
            max_score: self.max_score,
            passing_score: self.passing_score,
            field_passing_scores: self.field_passing_scores.clone(),
            warning_threshold_secs: self.warning_threshold_secs,
            critical_threshold_secs: self.critical_threshold_secs,
        }
    }

    #[must_use]
    pub fn quota(&self, field: Field) -> u32 {
        self.field_quotas.get(&field).copied().unwrap_or(0)
    }

    /// Configured exam length: the sum of all field quotas.
    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.field_quotas.values().sum()
    }

    #[must_use]
    pub fn time_limit_minutes(&self) -> u32 {
        self.time_limit_minutes
    }

    #[must_use]
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_minutes.saturating_mul(60)
    }

    #[must_use]
    pub fn max_score(&self) -> u32 {
        self.max_score
    }

    #[must_use]
    pub fn passing_score(&self) -> u32 {
        self.passing_score
    }

    #[must_use]
    pub fn field_passing_score(&self, field: Field) -> u32 {
        self.field_passing_scores.get(&field).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn warning_threshold_secs(&self) -> u32 {
        self.warning_threshold_secs
    }

    #[must_use]
    pub fn critical_threshold_secs(&self) -> u32 {
        self.critical_threshold_secs
    }
}
