//! Single-deadline phase timer for Impostor room actors.
//!
//! A room has at most one pending timeout at any instant: the reveal delay,
//! the current speaker's turn, the vote window, or the pause between a
//! round's results and what follows. [`PhaseTimer`] holds that one
//! deadline together with a caller-chosen token identifying it.
//!
//! # Disarmed mode
//!
//! When nothing is armed, [`PhaseTimer::wait`] pends forever. This keeps
//! the room idle in the lobby without a polling loop.
//!
//! # Integration
//!
//! The timer sits inside a room actor's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands, maybe re-arm */ }
//!         token = timer.wait() => { /* feed the token back into the room */ }
//!     }
//! }
//! ```
//!
//! `wait` is cancel-safe: if the command branch wins the race, the deadline
//! stays armed and the next call to `wait` picks it up again.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Counters describing what a [`PhaseTimer`] has done so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerMetrics {
    /// Times a deadline was armed.
    pub armed: u64,
    /// Times an armed deadline replaced one that had not fired yet.
    pub replaced: u64,
    /// Times a deadline was cancelled before it fired.
    pub cancelled: u64,
    /// Times a deadline fired.
    pub fired: u64,
}

// ---------------------------------------------------------------------------
// Timer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Armed<T> {
    deadline: Instant,
    token: T,
}

/// Holds at most one armed deadline and yields its token when it expires.
///
/// One `PhaseTimer` per room actor.
#[derive(Debug)]
pub struct PhaseTimer<T> {
    armed: Option<Armed<T>>,
    metrics: TimerMetrics,
}

impl<T> Default for PhaseTimer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PhaseTimer<T> {
    /// Creates a disarmed timer.
    pub fn new() -> Self {
        Self {
            armed: None,
            metrics: TimerMetrics::default(),
        }
    }

    /// Arms the timer to fire `after` from now, replacing any armed deadline.
    pub fn arm(&mut self, token: T, after: Duration) {
        if self.armed.is_some() {
            self.metrics.replaced += 1;
        }
        self.metrics.armed += 1;
        let now = Instant::now();
        let deadline = now.checked_add(after).unwrap_or_else(|| far_future(now));
        trace!(after_ms = after.as_millis() as u64, "phase timer armed");
        self.armed = Some(Armed { deadline, token });
    }

    /// Disarms the timer. Returns the token that was armed, if any.
    pub fn cancel(&mut self) -> Option<T> {
        let armed = self.armed.take()?;
        self.metrics.cancelled += 1;
        trace!("phase timer cancelled");
        Some(armed.token)
    }

    /// Whether a deadline is currently armed.
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Time left until the armed deadline, or `None` when disarmed.
    pub fn remaining(&self) -> Option<Duration> {
        self.armed
            .as_ref()
            .map(|a| a.deadline.saturating_duration_since(Instant::now()))
    }

    /// The token of the armed deadline.
    pub fn token(&self) -> Option<&T> {
        self.armed.as_ref().map(|a| &a.token)
    }

    /// Snapshot of the counters.
    pub fn metrics(&self) -> &TimerMetrics {
        &self.metrics
    }
}

/// A deadline that will not pass while the process runs, for delays too
/// large to add to `now`.
fn far_future(now: Instant) -> Instant {
    now + Duration::from_secs(86_400 * 365 * 30)
}

impl<T: Clone> PhaseTimer<T> {
    /// Waits until the armed deadline passes, disarms, and returns its token.
    ///
    /// Pends forever while disarmed.
    pub async fn wait(&mut self) -> T {
        let deadline = match &self.armed {
            Some(armed) => armed.deadline,
            None => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        };

        time::sleep_until(deadline).await;

        // The deadline cannot have changed while we slept: arm/cancel need
        // `&mut self`, which this future holds.
        match self.armed.take() {
            Some(armed) => {
                self.metrics.fired += 1;
                debug!(fired = self.metrics.fired, "phase timer fired");
                armed.token
            }
            None => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}
