use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

/// One elapsed second of exam attempt `attempt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExamTick {
    pub attempt: u64,
}

/// Background task emitting one [`ExamTick`] per period.
///
/// The task is aborted on [`cancel`](Self::cancel) or drop, so no tick for
/// this attempt is produced afterwards. Ticks already queued in the channel
/// can still arrive; consumers match them against the live attempt.
#[derive(Debug)]
pub struct CountdownTicker {
    attempt: u64,
    handle: JoinHandle<()>,
}

impl CountdownTicker {
    /// Spawn a ticker on the current tokio runtime.
    ///
    /// The first tick is sent one full `period` after spawning.
    #[must_use]
    pub fn spawn(attempt: u64, period: Duration, ticks: mpsc::Sender<ExamTick>) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
            // The first interval tick completes immediately.
            ticker.tick().await;
            tracing::debug!(attempt, "countdown ticker started");

            loop {
                ticker.tick().await;
                if ticks.send(ExamTick { attempt }).await.is_err() {
                    tracing::debug!(attempt, "tick receiver dropped, stopping ticker");
                    break;
                }
            }
        });
        Self { attempt, handle }
    }

    /// One tick per second.
    #[must_use]
    pub fn every_second(attempt: u64, ticks: mpsc::Sender<ExamTick>) -> Self {
        Self::spawn(attempt, Duration::from_secs(1), ticks)
    }

    #[must_use]
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for CountdownTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
