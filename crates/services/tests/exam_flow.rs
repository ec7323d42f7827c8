mod common;

use exam_core::ExamConfig;
use exam_core::model::{Field, QuestionId};
use exam_core::time::fixed_clock;
use exam_core::timer::{AlertLevel, TimerState};
use services::{ExamApp, ExamPhase, PreconditionError, TickOutcome};

const FULL_EXAM_SECS: u32 = 165 * 60;

async fn standard_app() -> ExamApp {
    ExamApp::in_memory(common::catalog(35, 20, 45), ExamConfig::standard(), fixed_clock())
        .await
        .with_seed(42)
}

#[tokio::test]
async fn failing_technology_fails_the_exam() {
    let mut app = standard_app().await;
    let questions = app.start_mock_exam().await.unwrap().questions().to_vec();
    assert_eq!(questions.len(), 100);

    for question in &questions {
        let pick = if question.field() == Field::Technology {
            common::wrong_option(question)
        } else {
            question.correct_answer()
        };
        app.submit_exam_answer(question.id(), pick).unwrap();
    }

    let result = app.finish_mock_exam().await.unwrap();
    assert_eq!(result.score(), 550);
    assert_eq!(result.field_score(Field::Strategy), 1000);
    assert_eq!(result.field_score(Field::Management), 1000);
    assert_eq!(result.field_score(Field::Technology), 0);
    assert_eq!(result.correct_answers(), 55);
    assert!(!result.passed());

    assert_eq!(app.exam_phase(), ExamPhase::Results);
    assert_eq!(app.state().mock_exam_results().len(), 1);
    // Exam answers stay out of study progress.
    assert_eq!(app.state().study_progress().answered_questions(), 0);
    assert!(app.state().answer_history().is_empty());
}

#[tokio::test]
async fn unanswered_questions_score_as_incorrect() {
    let mut app = standard_app().await;
    let questions = app.start_mock_exam().await.unwrap().questions().to_vec();
    for question in questions.iter().take(70) {
        app.submit_exam_answer(question.id(), question.correct_answer())
            .unwrap();
    }

    let result = app.finish_mock_exam().await.unwrap();
    assert_eq!(result.score(), 700);
    assert_eq!(
        result
            .answers()
            .iter()
            .filter(|a| a.selected_answer.is_none())
            .count(),
        30
    );
}

#[tokio::test]
async fn full_countdown_expires_exactly_once() {
    let mut app = standard_app().await;
    let attempt = app.start_mock_exam().await.unwrap().attempt();
    let first = app.mock_exam().unwrap().questions()[0].clone();
    app.submit_exam_answer(first.id(), first.correct_answer())
        .unwrap();

    let mut expirations = Vec::new();
    let mut warned_at = None;
    for second in 1..=FULL_EXAM_SECS {
        match app.tick_exam(attempt).await {
            TickOutcome::Expired(result) => expirations.push(result),
            TickOutcome::Ticked(countdown) => {
                if warned_at.is_none() && countdown.level == AlertLevel::Warning {
                    warned_at = Some(second);
                }
            }
            TickOutcome::Ignored => panic!("tick {second} ignored"),
        }
    }

    assert_eq!(expirations.len(), 1);
    assert_eq!(warned_at, Some(FULL_EXAM_SECS - 1800));
    let expired = &expirations[0];
    assert_eq!(expired.time_spent_secs(), FULL_EXAM_SECS);
    assert_eq!(expired.score(), 10);

    // A finish arriving after expiry returns the recorded result.
    let finished = app.finish_mock_exam().await.unwrap();
    assert_eq!(finished.id(), expired.id());
    assert_eq!(app.tick_exam(attempt).await, TickOutcome::Ignored);
    assert_eq!(app.state().mock_exam_results().len(), 1);

    assert_eq!(
        app.submit_exam_answer(first.id(), 0),
        Err(PreconditionError::NoActiveExam)
    );
}

#[tokio::test]
async fn leaving_results_resets_for_a_retake() {
    let mut app = standard_app().await;
    let countdown = app.subscribe_countdown();

    app.start_mock_exam().await.unwrap();
    assert_eq!(countdown.borrow().state, TimerState::Running);
    app.finish_mock_exam().await.unwrap();
    assert_eq!(countdown.borrow().state, TimerState::Ended);

    app.leave_exam_results();
    assert_eq!(app.exam_phase(), ExamPhase::Setup);
    assert_eq!(countdown.borrow().state, TimerState::Idle);

    let retake = app.start_mock_exam().await.unwrap();
    assert_eq!(retake.attempt(), 2);
    assert_eq!(retake.countdown().remaining_secs, FULL_EXAM_SECS);
    assert_eq!(retake.answered_count(), 0);
}

#[tokio::test]
async fn navigation_moves_the_exam_cursor() {
    let mut app = standard_app().await;
    let questions = app.start_mock_exam().await.unwrap().questions().to_vec();

    let jumped = app.go_to_exam_question(57).unwrap().clone();
    assert_eq!(jumped.id(), questions[57].id());
    let exam = app.mock_exam().unwrap();
    assert_eq!(exam.current_index(), 57);
    assert_eq!(exam.current_question().map(|q| q.id()), Some(questions[57].id()));

    assert_eq!(
        app.go_to_exam_question(100).unwrap_err(),
        PreconditionError::QuestionIndexOutOfRange { index: 100, len: 100 }
    );
    assert_eq!(app.mock_exam().unwrap().current_index(), 57);

    app.finish_mock_exam().await.unwrap();
    assert_eq!(
        app.go_to_exam_question(0).unwrap_err(),
        PreconditionError::NoActiveExam
    );
}

#[tokio::test]
async fn answers_to_foreign_questions_are_rejected() {
    let mut app = standard_app().await;
    app.start_mock_exam().await.unwrap();
    let stranger = QuestionId::new("zz-1");
    assert_eq!(
        app.submit_exam_answer(&stranger, 0),
        Err(PreconditionError::UnknownExamQuestion(stranger.clone()))
    );
}

#[tokio::test]
async fn reset_clears_everything() {
    let mut app = standard_app().await;
    app.start_study_session(Field::Management).await.unwrap();
    app.submit_answer(1).await.unwrap();
    app.start_mock_exam().await.unwrap();
    app.finish_mock_exam().await.unwrap();

    app.reset_all_progress().await;

    assert!(app.study_session().is_none());
    assert_eq!(app.exam_phase(), ExamPhase::Setup);
    assert_eq!(app.state(), &exam_core::model::AppState::new());
    assert_eq!(app.stats().exams_taken, 0);
}
