//! Preventive pacing of marketplace API calls.
//!
//! This is a fixed schedule keyed on the number of calls issued, not an
//! adaptive rate limiter: every `every`-th call pauses for
//! `query_count % modulus` seconds before going out. It never rejects a call.
//! Real throttling responses from the API surface as errors instead.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

/// Call-count schedule for pacing pauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingSchedule {
    /// Pause on every call whose count is a multiple of this.
    pub every: u64,
    /// Pause length in seconds is the call count modulo this.
    pub modulus: u64,
}

impl Default for PacingSchedule {
    fn default() -> Self {
        Self {
            every: 15,
            modulus: 25,
        }
    }
}

impl PacingSchedule {
    /// Seconds to pause before the call numbered `query_count` (1-based).
    pub fn wait_secs(&self, query_count: u64) -> u64 {
        match query_count.checked_rem(self.every) {
            Some(0) => query_count.checked_rem(self.modulus).unwrap_or(0),
            _ => 0,
        }
    }
}

/// Counters for one harvest run. Both only ever grow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleState {
    pub query_count: u64,
    pub total_waited: Duration,
}

impl ThrottleState {
    pub fn total_waited_secs(&self) -> u64 {
        self.total_waited.as_secs()
    }
}

/// How a pacing pause is carried out.
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

/// Blocks the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<F: FnMut(Duration)> Sleeper for F {
    fn sleep(&mut self, duration: Duration) {
        self(duration)
    }
}

/// Stateful pacing policy, consulted immediately before each outbound call.
#[derive(Debug)]
pub struct Throttle<S: Sleeper = ThreadSleeper> {
    schedule: PacingSchedule,
    state: ThrottleState,
    sleeper: S,
}

impl Throttle<ThreadSleeper> {
    pub fn new(schedule: PacingSchedule) -> Self {
        Self::with_sleeper(schedule, ThreadSleeper)
    }
}

impl<S: Sleeper> Throttle<S> {
    pub fn with_sleeper(schedule: PacingSchedule, sleeper: S) -> Self {
        Self {
            schedule,
            state: ThrottleState::default(),
            sleeper,
        }
    }

    /// Count a call and pause if the schedule says so. Returns the pause applied.
    pub fn before_call(&mut self) -> Duration {
        self.before_call_with(|_, _| {})
    }

    /// Like [`before_call`](Self::before_call), but `on_pause` is told about a
    /// pause before it starts. The state passed still holds the total waited
    /// before this pause.
    pub fn before_call_with(&mut self, on_pause: impl FnOnce(Duration, &ThrottleState)) -> Duration {
        self.state.query_count += 1;
        let wait = Duration::from_secs(self.schedule.wait_secs(self.state.query_count));

        if !wait.is_zero() {
            info!(
                wait_secs = wait.as_secs(),
                total_waited_secs = self.state.total_waited_secs(),
                queries = self.state.query_count,
                "pacing pause"
            );
            on_pause(wait, &self.state);
            self.sleeper.sleep(wait);
            self.state.total_waited += wait;
        }

        wait
    }

    pub fn state(&self) -> &ThrottleState {
        &self.state
    }

    pub fn into_state(self) -> ThrottleState {
        self.state
    }
}
