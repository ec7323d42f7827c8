//! Shared error types for the services crate.

use std::path::PathBuf;

use thiserror::Error;

use exam_core::model::{Field, QuestionId};
use exam_core::timer::TimerError;
use exam_core::{CatalogError, ConfigError};
use storage::sqlite::SqliteInitError;

/// A consumer call made while the app was not in a state that allows it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PreconditionError {
    #[error("no active study session")]
    NoActiveStudySession,
    #[error("a study session is already active")]
    StudySessionActive,
    #[error("no questions available for field {0}")]
    NoQuestionsInField(Field),
    #[error("no question is currently presented")]
    NoCurrentQuestion,
    #[error("the current question was already answered")]
    AlreadyAnswered,
    #[error("option {index} is out of range ({options} options)")]
    OptionOutOfRange { index: usize, options: usize },
    #[error("no mock exam in progress")]
    NoActiveExam,
    #[error("a mock exam is already in progress")]
    ExamInProgress,
    #[error("the catalog has no questions for any exam field")]
    EmptyExam,
    #[error("question {0} is not part of the current exam")]
    UnknownExamQuestion(QuestionId),
    #[error("question index {index} is out of range ({len} questions)")]
    QuestionIndexOutOfRange { index: usize, len: usize },
    #[error(transparent)]
    Timer(#[from] TimerError),
}

/// Errors emitted while bootstrapping the application store.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppInitError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
