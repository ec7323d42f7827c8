mod session;

pub use session::{StudySession, StudySummary};
