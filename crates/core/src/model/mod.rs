mod answer;
mod exam_result;
mod field;
mod ids;
mod progress;
mod question;
mod state;

pub use ids::{ExamResultId, ParseIdError, QuestionId};

pub use answer::AnswerRecord;
pub use exam_result::MockExamResult;
pub use field::{Field, FieldParseError};
pub use progress::{
    CategoryTally, FieldProgress, StudyProgress, WEAK_ACCURACY_THRESHOLD, accuracy_percent,
};
pub use question::{Question, QuestionError};
pub use state::AppState;
