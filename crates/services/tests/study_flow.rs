mod common;

use chrono::Duration;
use exam_core::ExamConfig;
use exam_core::model::Field;
use exam_core::time::fixed_clock;
use services::{ExamApp, PreconditionError};
use storage::StateRepository;
use storage::repository::Storage;

#[tokio::test]
async fn study_session_updates_progress_and_persists() {
    let storage = Storage::in_memory();
    let catalog = common::catalog(4, 4, 4);
    let mut app = ExamApp::load(
        StateRepository::from_storage(&storage),
        catalog.clone(),
        ExamConfig::standard(),
        fixed_clock(),
    )
    .await
    .with_seed(5);

    let first = app.start_study_session(Field::Strategy).await.unwrap().clone();
    assert_eq!(first.field(), Field::Strategy);

    app.clock_mut().advance(Duration::seconds(40));
    let record = app.submit_answer(first.correct_answer()).await.unwrap();
    assert!(record.is_correct);
    assert_eq!(record.time_spent_secs, 40);
    assert_eq!(
        app.submit_answer(0).await.unwrap_err(),
        PreconditionError::AlreadyAnswered
    );

    assert!(app.next_question().await.unwrap());
    let second = app
        .study_session()
        .and_then(|s| s.current_question())
        .unwrap()
        .clone();
    app.submit_answer(common::wrong_option(&second)).await.unwrap();

    assert!(app.previous_question().await.unwrap());
    app.submit_answer(first.correct_answer()).await.unwrap();

    app.clock_mut().advance(Duration::seconds(150));
    let summary = app.end_study_session().await.unwrap();
    assert_eq!(summary.answered, 3);
    assert_eq!(summary.correct, 2);
    assert_eq!(summary.minutes, 3);

    let progress = app.state().study_progress();
    assert_eq!(progress.total_questions(), 3);
    assert_eq!(progress.answered_questions(), 3);
    assert_eq!(progress.correct_answers(), 2);
    assert_eq!(progress.study_time_minutes(), 3);
    assert_eq!(progress.field(Field::Strategy).accuracy(), 67);
    assert_eq!(progress.field(Field::Management).answered_questions(), 0);
    assert_eq!(app.state().answer_history().len(), 3);

    // A second app over the same store sees the saved document.
    let reloaded = ExamApp::load(
        StateRepository::from_storage(&storage),
        catalog,
        ExamConfig::standard(),
        fixed_clock(),
    )
    .await;
    assert_eq!(reloaded.state(), app.state());
}

#[tokio::test]
async fn weak_categories_and_fields_surface() {
    let mut app = ExamApp::in_memory(common::catalog(0, 0, 6), ExamConfig::standard(), fixed_clock())
        .await
        .with_seed(8);

    app.start_study_session(Field::Technology).await.unwrap();
    loop {
        let question = app
            .study_session()
            .and_then(|s| s.current_question())
            .unwrap()
            .clone();
        let pick = if question.category() == "security" {
            question.correct_answer()
        } else {
            common::wrong_option(&question)
        };
        app.submit_answer(pick).await.unwrap();
        if !app.next_question().await.unwrap() {
            break;
        }
    }
    app.end_study_session().await.unwrap();

    let technology = app.state().study_progress().field(Field::Technology);
    assert_eq!(technology.answered_questions(), 6);
    assert_eq!(technology.correct_answers(), 2);
    assert_eq!(technology.weak_categories(), ["network".to_string()]);
    assert_eq!(app.state().study_progress().weak_fields(), vec![Field::Technology]);

    let stats = app.stats();
    assert_eq!(stats.overall_accuracy, 33);
    assert_eq!(stats.streak_days, 1);
    assert_eq!(stats.weakest_field, Some(Field::Technology));
}

#[tokio::test]
async fn empty_field_cannot_be_studied() {
    let mut app =
        ExamApp::in_memory(common::catalog(2, 0, 2), ExamConfig::standard(), fixed_clock()).await;
    assert_eq!(
        app.start_study_session(Field::Management).await.unwrap_err(),
        PreconditionError::NoQuestionsInField(Field::Management)
    );
    assert!(app.study_session().is_none());
}
