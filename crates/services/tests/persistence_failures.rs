mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Duration;
use exam_core::ExamConfig;
use exam_core::model::{AppState, Field};
use exam_core::time::fixed_clock;
use services::ExamApp;
use storage::StateRepository;
use storage::repository::{KeyValueStore, StorageError};

/// Store whose backend is unreachable for every call.
#[derive(Default)]
struct UnreachableStore {
    writes: AtomicUsize,
}

#[async_trait]
impl KeyValueStore for UnreachableStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Connection("disk unavailable".into()))
    }

    async fn put(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::Connection("disk unavailable".into()))
    }

    async fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Connection("disk unavailable".into()))
    }
}

#[tokio::test]
async fn unreadable_store_starts_fresh() {
    let store = Arc::new(UnreachableStore::default());
    let app = ExamApp::load(
        StateRepository::new(store),
        common::catalog(2, 2, 2),
        ExamConfig::standard(),
        fixed_clock(),
    )
    .await;

    assert_eq!(app.state(), &AppState::new());
}

#[tokio::test]
async fn failed_writes_keep_the_in_memory_state() {
    let store = Arc::new(UnreachableStore::default());
    let mut app = ExamApp::load(
        StateRepository::new(store.clone()),
        common::catalog(0, 3, 0),
        ExamConfig::standard(),
        fixed_clock(),
    )
    .await
    .with_seed(2);

    let question = app
        .start_study_session(Field::Management)
        .await
        .unwrap()
        .clone();
    app.clock_mut().advance(Duration::seconds(65));
    let record = app.submit_answer(question.correct_answer()).await.unwrap();
    assert!(record.is_correct);
    let summary = app.end_study_session().await.unwrap();
    assert_eq!(summary.answered, 1);
    assert_eq!(summary.minutes, 1);

    let progress = app.state().study_progress();
    assert_eq!(progress.answered_questions(), 1);
    assert_eq!(progress.correct_answers(), 1);
    assert_eq!(progress.study_time_minutes(), 1);
    assert_eq!(app.state().answer_history().len(), 1);
    assert!(store.writes.load(Ordering::SeqCst) >= 3);
}

#[tokio::test]
async fn failed_writes_still_record_exam_results() {
    let store = Arc::new(UnreachableStore::default());
    let mut app = ExamApp::load(
        StateRepository::new(store),
        common::catalog(35, 20, 45),
        ExamConfig::standard(),
        fixed_clock(),
    )
    .await
    .with_seed(4);

    app.start_mock_exam().await.unwrap();
    let result = app.finish_mock_exam().await.unwrap();
    assert_eq!(result.score(), 0);
    assert_eq!(app.state().mock_exam_results().len(), 1);
}
