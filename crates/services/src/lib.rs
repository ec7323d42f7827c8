#![forbid(unsafe_code)]

pub mod app;
pub mod error;
pub mod exams;
pub mod study;

pub use exam_core::Clock;

pub use app::{ExamApp, ExamPhase, TickOutcome, load_catalog, load_config};
pub use error::{AppInitError, PreconditionError};
pub use exams::{
    CountdownTicker, ExamBuilder, ExamPlan, ExamTick, MockExam, QuotaFill, sample_for_study,
};
pub use study::{StudySession, StudySummary};
