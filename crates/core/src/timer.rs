//! Countdown state machine for a timed exam.
//!
//! `Idle -> Running -> {Expired | Ended}`; `reset` returns to `Idle`. The timer
//! does not own a clock: each `tick` is one elapsed second, driven from outside.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ExamConfig;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TimerError {
    #[error("timer can only start from idle (currently {0:?})")]
    NotIdle(TimerState),

    #[error("timer duration must be > 0 seconds")]
    ZeroDuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    /// Ran out of time; the exam is force-finished.
    Expired,
    /// Finished by the learner before time ran out.
    Ended,
}

/// How close the countdown is to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Normal,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Tick {
        remaining_secs: u32,
        level: AlertLevel,
    },
    /// Emitted exactly once, on the tick that reaches zero.
    Expired,
}

/// Point-in-time view of the countdown, for subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Countdown {
    pub state: TimerState,
    pub remaining_secs: u32,
    pub total_secs: u32,
    pub level: AlertLevel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamTimer {
    state: TimerState,
    total_secs: u32,
    remaining_secs: u32,
    warning_secs: u32,
    critical_secs: u32,
}

impl ExamTimer {
    #[must_use]
    pub fn new(warning_secs: u32, critical_secs: u32) -> Self {
        Self {
            state: TimerState::Idle,
            total_secs: 0,
            remaining_secs: 0,
            warning_secs,
            critical_secs,
        }
    }

    /// An idle timer using the config's alert thresholds.
    #[must_use]
    pub fn from_config(config: &ExamConfig) -> Self {
        Self::new(
            config.warning_threshold_secs(),
            config.critical_threshold_secs(),
        )
    }

    /// Start counting down from `minutes * 60` seconds.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::NotIdle` unless the timer is idle, or
    /// `TimerError::ZeroDuration` for a zero duration.
    pub fn start_minutes(&mut self, minutes: u32) -> Result<(), TimerError> {
        self.start(minutes.saturating_mul(60))
    }

    /// Start counting down from `duration_secs`.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::NotIdle` unless the timer is idle, or
    /// `TimerError::ZeroDuration` for a zero duration.
    pub fn start(&mut self, duration_secs: u32) -> Result<(), TimerError> {
        if self.state != TimerState::Idle {
            return Err(TimerError::NotIdle(self.state));
        }
        if duration_secs == 0 {
            return Err(TimerError::ZeroDuration);
        }
        self.total_secs = duration_secs;
        self.remaining_secs = duration_secs;
        self.state = TimerState::Running;
        Ok(())
    }

    /// Advance by one second.
    ///
    /// Returns `None` unless running. The tick that reaches zero moves the
    /// timer to `Expired` and returns `TimerEvent::Expired`.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        if self.state != TimerState::Running {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.state = TimerState::Expired;
            return Some(TimerEvent::Expired);
        }
        Some(TimerEvent::Tick {
            remaining_secs: self.remaining_secs,
            level: self.level(),
        })
    }

    /// Learner-initiated finish. Returns false if the timer was not running,
    /// so a finish that races an expiry changes nothing.
    pub fn finish(&mut self) -> bool {
        if self.state != TimerState::Running {
            return false;
        }
        self.state = TimerState::Ended;
        true
    }

    /// Back to `Idle`; nothing carries over to the next attempt.
    pub fn reset(&mut self) {
        self.state = TimerState::Idle;
        self.total_secs = 0;
        self.remaining_secs = 0;
    }

    #[must_use]
    pub fn state(&self) -> TimerState {
        self.state
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.state, TimerState::Expired | TimerState::Ended)
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    #[must_use]
    pub fn total_secs(&self) -> u32 {
        self.total_secs
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> u32 {
        self.total_secs - self.remaining_secs
    }

    #[must_use]
    pub fn level(&self) -> AlertLevel {
        if self.state == TimerState::Idle {
            AlertLevel::Normal
        } else if self.remaining_secs <= self.critical_secs {
            AlertLevel::Critical
        } else if self.remaining_secs <= self.warning_secs {
            AlertLevel::Warning
        } else {
            AlertLevel::Normal
        }
    }

    #[must_use]
    pub fn countdown(&self) -> Countdown {
        Countdown {
            state: self.state,
            remaining_secs: self.remaining_secs,
            total_secs: self.total_secs,
            level: self.level(),
        }
    }
}
