use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{mpsc, watch};

use exam_core::model::{
    AnswerRecord, AppState, ExamResultId, Field, MockExamResult, Question, QuestionId,
};
use exam_core::stats::StudyStats;
use exam_core::timer::{Countdown, ExamTimer, TimerEvent};
use exam_core::{Clock, ExamConfig, QuestionCatalog};
use storage::StateRepository;
use storage::repository::Storage;

use crate::error::{AppInitError, PreconditionError};
use crate::exams::{
    CountdownTicker, ExamBuilder, ExamTick, MockExam, QuotaFill, sample_for_study,
};
use crate::study::{StudySession, StudySummary};

const TICK_CHANNEL_CAPACITY: usize = 64;

/// Read and validate a question catalog from a JSON file.
///
/// # Errors
///
/// Returns `AppInitError::Read` if the file cannot be read, or
/// `AppInitError::Catalog` if its contents are not a valid catalog.
pub fn load_catalog(path: &Path) -> Result<QuestionCatalog, AppInitError> {
    let raw = std::fs::read_to_string(path).map_err(|source| AppInitError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(QuestionCatalog::from_json_str(&raw)?)
}

/// Read and validate an exam config from a JSON file.
///
/// # Errors
///
/// Returns `AppInitError::Read` if the file cannot be read, or
/// `AppInitError::Config` if the document is invalid.
pub fn load_config(path: &Path) -> Result<ExamConfig, AppInitError> {
    let raw = std::fs::read_to_string(path).map_err(|source| AppInitError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ExamConfig::from_json_str(&raw)?)
}

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// What a countdown tick did to the exam.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Tick for a stale attempt, or no exam running.
    Ignored,
    Ticked(Countdown),
    /// Time ran out; the exam was graded and recorded.
    Expired(MockExamResult),
}

/// Where the mock exam flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamPhase {
    Setup,
    InProgress,
    Results,
}

struct ActiveExam {
    exam: MockExam,
    ticker: Option<CountdownTicker>,
    result: Option<MockExamResult>,
}

impl ActiveExam {
    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
            tracing::debug!(attempt = ticker.attempt(), "countdown ticker stopped");
        }
    }
}

/// Stop the clock side of `active` and grade it. The caller records the result.
fn close_exam(
    active: &mut ActiveExam,
    config: &ExamConfig,
    now: DateTime<Utc>,
) -> (MockExamResult, Countdown) {
    active.stop_ticker();
    let result = active.exam.grade(ExamResultId::generate(), now, config);
    active.result = Some(result.clone());
    (result, active.exam.countdown())
}

//
// ─── APP ───────────────────────────────────────────────────────────────────────
//

/// Owns the learner state and the live study/exam sessions.
///
/// Every mutation goes through `&mut self`, so writes to the persisted
/// document are serialized by ownership. The document is saved after each
/// mutation; save failures are logged and the in-memory state carries on.
pub struct ExamApp {
    state: AppState,
    repo: StateRepository,
    catalog: Arc<QuestionCatalog>,
    config: ExamConfig,
    clock: Clock,
    rng: StdRng,
    study: Option<StudySession>,
    exam: Option<ActiveExam>,
    next_attempt: u64,
    ticks: Option<mpsc::Sender<ExamTick>>,
    countdown: watch::Sender<Countdown>,
}

impl ExamApp {
    /// Load persisted state through `repo`; unreadable state starts fresh.
    pub async fn load(
        repo: StateRepository,
        catalog: Arc<QuestionCatalog>,
        config: ExamConfig,
        clock: Clock,
    ) -> Self {
        let state = repo.load().await;
        let idle = ExamTimer::from_config(&config).countdown();
        let (countdown, _) = watch::channel(idle);
        tracing::info!(
            questions = catalog.len(),
            exams = state.mock_exam_results().len(),
            answered = state.study_progress().answered_questions(),
            "exam app loaded"
        );

        Self {
            state,
            repo,
            catalog,
            config,
            clock,
            rng: StdRng::from_rng(&mut rand::rng()),
            study: None,
            exam: None,
            next_attempt: 1,
            ticks: None,
            countdown,
        }
    }

    /// Build an app backed by `SQLite` at `db_url`.
    ///
    /// # Errors
    ///
    /// Returns `AppInitError::Sqlite` if the database cannot be opened or migrated.
    pub async fn new_sqlite(
        db_url: &str,
        catalog: Arc<QuestionCatalog>,
        config: ExamConfig,
        clock: Clock,
    ) -> Result<Self, AppInitError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::load(StateRepository::from_storage(&storage), catalog, config, clock).await)
    }

    /// Build an app over a fresh in-memory store.
    pub async fn in_memory(
        catalog: Arc<QuestionCatalog>,
        config: ExamConfig,
        clock: Clock,
    ) -> Self {
        Self::load(StateRepository::in_memory(), catalog, config, clock).await
    }

    /// Use a seeded RNG for deterministic sampling.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Spawn a one-second ticker for each exam started from now on.
    ///
    /// The caller feeds every received tick back into [`tick_exam`](Self::tick_exam).
    /// Must be called within a tokio runtime before starting an exam.
    pub fn enable_countdown(&mut self) -> mpsc::Receiver<ExamTick> {
        let (tx, rx) = mpsc::channel(TICK_CHANNEL_CAPACITY);
        self.ticks = Some(tx);
        rx
    }

    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    #[must_use]
    pub fn config(&self) -> &ExamConfig {
        &self.config
    }

    #[must_use]
    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    #[must_use]
    pub fn stats(&self) -> StudyStats {
        StudyStats::compute(&self.state, self.clock.now().date_naive())
    }

    #[must_use]
    pub fn quota_report(&self) -> BTreeMap<Field, QuotaFill> {
        ExamBuilder::new(&self.catalog, &self.config).quota_report()
    }

    async fn persist(&self) {
        self.repo.save(&self.state).await;
    }

    // ─── STUDY ────────────────────────────────────────────────────────────────

    #[must_use]
    pub fn study_session(&self) -> Option<&StudySession> {
        self.study.as_ref()
    }

    /// Start practising `field` and present its first question.
    ///
    /// # Errors
    ///
    /// Returns `StudySessionActive` if a session is already running, or
    /// `NoQuestionsInField` if the catalog has nothing for `field`.
    pub async fn start_study_session(
        &mut self,
        field: Field,
    ) -> Result<&Question, PreconditionError> {
        if self.study.is_some() {
            return Err(PreconditionError::StudySessionActive);
        }
        let deck = sample_for_study(&self.catalog, field, &mut self.rng);
        let session = StudySession::new(field, deck, self.clock.now())?;
        tracing::info!(field = %field, questions = session.len(), "study session started");

        self.state.record_presented(field);
        self.persist().await;
        let session = self.study.insert(session);
        session
            .current_question()
            .ok_or(PreconditionError::NoCurrentQuestion)
    }

    /// Answer the presented study question and fold it into progress.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveStudySession` without a session, or whatever the
    /// session rejects (`AlreadyAnswered`, `OptionOutOfRange`).
    pub async fn submit_answer(
        &mut self,
        answer_index: usize,
    ) -> Result<AnswerRecord, PreconditionError> {
        let now = self.clock.now();
        let session = self
            .study
            .as_mut()
            .ok_or(PreconditionError::NoActiveStudySession)?;
        let record = session.answer(answer_index, now)?;
        let question = session
            .current_question()
            .ok_or(PreconditionError::NoCurrentQuestion)?
            .clone();

        tracing::debug!(
            question = %record.question_id,
            correct = record.is_correct,
            "study answer recorded"
        );
        self.state.record_study_answer(record.clone(), &question);
        self.persist().await;
        Ok(record)
    }

    /// Present the next study question. `Ok(false)` at the end of the deck.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveStudySession` without a session.
    pub async fn next_question(&mut self) -> Result<bool, PreconditionError> {
        let now = self.clock.now();
        let session = self
            .study
            .as_mut()
            .ok_or(PreconditionError::NoActiveStudySession)?;
        let moved = session.advance(now);
        if moved {
            let field = session.field();
            self.state.record_presented(field);
            self.persist().await;
        }
        Ok(moved)
    }

    /// Present the previous study question again. `Ok(false)` at the start.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveStudySession` without a session.
    pub async fn previous_question(&mut self) -> Result<bool, PreconditionError> {
        let now = self.clock.now();
        let session = self
            .study
            .as_mut()
            .ok_or(PreconditionError::NoActiveStudySession)?;
        let moved = session.retreat(now);
        if moved {
            let field = session.field();
            self.state.record_presented(field);
            self.persist().await;
        }
        Ok(moved)
    }

    /// End the study session and add its whole minutes to study time.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveStudySession` without a session.
    pub async fn end_study_session(&mut self) -> Result<StudySummary, PreconditionError> {
        let session = self
            .study
            .take()
            .ok_or(PreconditionError::NoActiveStudySession)?;
        let now = self.clock.now();
        let summary = session.summary(now);

        self.state.record_session_end(Some(session.started_at()), now);
        self.persist().await;
        tracing::info!(
            field = %summary.field,
            answered = summary.answered,
            minutes = summary.minutes,
            "study session ended"
        );
        Ok(summary)
    }

    // ─── MOCK EXAM ────────────────────────────────────────────────────────────

    #[must_use]
    pub fn exam_phase(&self) -> ExamPhase {
        match &self.exam {
            None => ExamPhase::Setup,
            Some(active) if active.result.is_some() => ExamPhase::Results,
            Some(_) => ExamPhase::InProgress,
        }
    }

    #[must_use]
    pub fn mock_exam(&self) -> Option<&MockExam> {
        self.exam.as_ref().map(|active| &active.exam)
    }

    /// Result of the exam on the results view, if any.
    #[must_use]
    pub fn exam_result(&self) -> Option<&MockExamResult> {
        self.exam.as_ref().and_then(|active| active.result.as_ref())
    }

    #[must_use]
    pub fn subscribe_countdown(&self) -> watch::Receiver<Countdown> {
        self.countdown.subscribe()
    }

    fn publish_countdown(&self, countdown: Countdown) {
        self.countdown.send_replace(countdown);
    }

    fn idle_countdown(&self) -> Countdown {
        ExamTimer::from_config(&self.config).countdown()
    }

    /// Draw a new exam and start its countdown.
    ///
    /// Starting from the results view discards that view first.
    ///
    /// # Errors
    ///
    /// Returns `ExamInProgress` if an exam is running, or `EmptyExam` if the
    /// catalog cannot supply any question.
    pub async fn start_mock_exam(&mut self) -> Result<&MockExam, PreconditionError> {
        if self.exam_phase() == ExamPhase::InProgress {
            return Err(PreconditionError::ExamInProgress);
        }
        self.exam = None;

        let plan = ExamBuilder::new(&self.catalog, &self.config).build(&mut self.rng);
        let attempt = self.next_attempt;
        let exam = MockExam::start(attempt, plan.questions, &self.config, self.clock.now())?;
        self.next_attempt += 1;

        let ticker = self
            .ticks
            .as_ref()
            .map(|tx| CountdownTicker::every_second(attempt, tx.clone()));
        tracing::info!(
            attempt,
            questions = exam.questions().len(),
            short = plan.fills.values().any(QuotaFill::is_short),
            "mock exam started"
        );
        self.publish_countdown(exam.countdown());

        let active = self.exam.insert(ActiveExam {
            exam,
            ticker,
            result: None,
        });
        Ok(&active.exam)
    }

    /// Record or change the answer to one exam question.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveExam` unless an exam is running, or what the exam
    /// rejects (`UnknownExamQuestion`, `OptionOutOfRange`).
    pub fn submit_exam_answer(
        &mut self,
        question_id: &QuestionId,
        answer_index: usize,
    ) -> Result<(), PreconditionError> {
        let now = self.clock.now();
        let active = self
            .exam
            .as_mut()
            .filter(|active| active.result.is_none())
            .ok_or(PreconditionError::NoActiveExam)?;
        active.exam.answer(question_id, answer_index, now)
    }

    /// Move the exam cursor to question `index`.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveExam` unless an exam is running, or
    /// `QuestionIndexOutOfRange`.
    pub fn go_to_exam_question(&mut self, index: usize) -> Result<&Question, PreconditionError> {
        let active = self
            .exam
            .as_mut()
            .filter(|active| active.result.is_none())
            .ok_or(PreconditionError::NoActiveExam)?;
        active.exam.go_to(index)
    }

    /// Apply one countdown second for `attempt`.
    ///
    /// Ticks for any attempt other than the running one are ignored. The tick
    /// that reaches zero grades and records the exam exactly once.
    pub async fn tick_exam(&mut self, attempt: u64) -> TickOutcome {
        let Some(active) = self.exam.as_mut() else {
            return TickOutcome::Ignored;
        };
        if active.exam.attempt() != attempt || active.result.is_some() {
            tracing::trace!(attempt, "ignoring stale exam tick");
            return TickOutcome::Ignored;
        }

        match active.exam.tick() {
            None => TickOutcome::Ignored,
            Some(TimerEvent::Tick { .. }) => {
                let countdown = active.exam.countdown();
                self.publish_countdown(countdown);
                TickOutcome::Ticked(countdown)
            }
            Some(TimerEvent::Expired) => {
                tracing::info!(attempt, "exam time expired");
                let closed = close_exam(active, &self.config, self.clock.now());
                TickOutcome::Expired(self.record_result(closed).await)
            }
        }
    }

    /// Finish the running exam and record its result.
    ///
    /// On the results view this returns the already recorded result, so a
    /// finish racing an expiry yields one completion.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveExam` when no exam was started.
    pub async fn finish_mock_exam(&mut self) -> Result<MockExamResult, PreconditionError> {
        let active = self.exam.as_mut().ok_or(PreconditionError::NoActiveExam)?;
        if let Some(result) = &active.result {
            return Ok(result.clone());
        }
        if !active.exam.finish() {
            return Err(PreconditionError::NoActiveExam);
        }
        tracing::info!(attempt = active.exam.attempt(), "exam finished by learner");
        let closed = close_exam(active, &self.config, self.clock.now());
        Ok(self.record_result(closed).await)
    }

    async fn record_result(
        &mut self,
        (result, countdown): (MockExamResult, Countdown),
    ) -> MockExamResult {
        self.publish_countdown(countdown);
        self.state.record_exam_result(result.clone());
        self.persist().await;
        tracing::info!(
            id = %result.id(),
            score = result.score(),
            passed = result.passed(),
            "exam result recorded"
        );
        result
    }

    /// Leave the exam flow (results view or abandoned attempt) back to setup.
    ///
    /// An abandoned running attempt is discarded without a result.
    pub fn leave_exam_results(&mut self) {
        if let Some(mut active) = self.exam.take() {
            active.stop_ticker();
            if active.result.is_none() {
                tracing::info!(attempt = active.exam.attempt(), "exam abandoned");
            }
        }
        self.publish_countdown(self.idle_countdown());
    }

    // ─── RESET ────────────────────────────────────────────────────────────────

    /// Drop all progress, history and live sessions, and persist the initial state.
    pub async fn reset_all_progress(&mut self) {
        self.study = None;
        self.leave_exam_results();
        self.state = AppState::new();
        self.persist().await;
        tracing::warn!("all progress reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::time::fixed_clock;

    fn catalog() -> Arc<QuestionCatalog> {
        let mut questions = Vec::new();
        for (prefix, field) in [
            ("st", Field::Strategy),
            ("ma", Field::Management),
            ("te", Field::Technology),
        ] {
            for i in 0..3 {
                questions.push(
                    Question::new(
                        QuestionId::new(format!("{prefix}-{i}")),
                        field,
                        "general",
                        "?",
                        vec!["a".into(), "b".into()],
                        0,
                        "",
                    )
                    .unwrap(),
                );
            }
        }
        Arc::new(QuestionCatalog::from_questions(questions).unwrap())
    }

    async fn app() -> ExamApp {
        ExamApp::in_memory(catalog(), ExamConfig::standard(), fixed_clock())
            .await
            .with_seed(11)
    }

    #[tokio::test]
    async fn study_calls_require_a_session() {
        let mut app = app().await;
        assert_eq!(
            app.submit_answer(0).await,
            Err(PreconditionError::NoActiveStudySession)
        );
        assert_eq!(
            app.next_question().await,
            Err(PreconditionError::NoActiveStudySession)
        );
        assert_eq!(
            app.end_study_session().await,
            Err(PreconditionError::NoActiveStudySession)
        );
    }

    #[tokio::test]
    async fn second_study_session_is_rejected() {
        let mut app = app().await;
        app.start_study_session(Field::Strategy).await.unwrap();
        assert_eq!(
            app.start_study_session(Field::Management).await.unwrap_err(),
            PreconditionError::StudySessionActive
        );
    }

    #[tokio::test]
    async fn exam_calls_require_an_exam() {
        let mut app = app().await;
        assert_eq!(
            app.submit_exam_answer(&QuestionId::new("st-0"), 0),
            Err(PreconditionError::NoActiveExam)
        );
        assert_eq!(
            app.finish_mock_exam().await.unwrap_err(),
            PreconditionError::NoActiveExam
        );
        assert_eq!(app.tick_exam(1).await, TickOutcome::Ignored);
    }

    #[tokio::test]
    async fn short_catalog_gives_short_exam() {
        let mut app = app().await;
        let exam = app.start_mock_exam().await.unwrap();
        assert_eq!(exam.questions().len(), 9);
        assert!(app.quota_report().values().all(QuotaFill::is_short));
        assert_eq!(
            app.start_mock_exam().await.unwrap_err(),
            PreconditionError::ExamInProgress
        );
    }

    #[tokio::test]
    async fn stale_attempt_ticks_are_ignored() {
        let mut app = app().await;
        app.start_mock_exam().await.unwrap();
        app.leave_exam_results();
        app.start_mock_exam().await.unwrap();

        assert_eq!(app.tick_exam(1).await, TickOutcome::Ignored);
        assert!(matches!(app.tick_exam(2).await, TickOutcome::Ticked(_)));
    }
}
