mod plan;
mod session;
mod ticker;

pub use plan::{ExamBuilder, ExamPlan, QuotaFill, sample_for_study};
pub use session::MockExam;
pub use ticker::{CountdownTicker, ExamTick};
