//! Liveness tracking for the monitored link.
//!
//! Holds the timestamp of the most recently validated heartbeat. The
//! "never observed" state is an explicit `None`, distinguishable from a
//! lost heartbeat at the type level, so the restart policy only ever
//! evaluates silence after at least one heartbeat has been seen.

use std::time::{Duration, Instant};

/// Tracks the last validated heartbeat. Owned exclusively by the monitor loop.
#[derive(Debug, Default)]
pub struct LivenessTracker {
    last_heartbeat_at: Option<Instant>,
}

impl LivenessTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a validated heartbeat observed at `now`.
    pub fn record_heartbeat(&mut self, now: Instant) {
        self.last_heartbeat_at = Some(now);
    }

    /// Elapsed silence as of `now`, or `None` if no heartbeat has been
    /// observed since startup or the last reset.
    #[must_use]
    pub fn silence_duration(&self, now: Instant) -> Option<Duration> {
        self.last_heartbeat_at
            .map(|last| now.saturating_duration_since(last))
    }

    /// Clear the tracker back to the never-observed state.
    ///
    /// Called once immediately after a restart is issued, successful or
    /// not, so the timeout clock restarts cleanly and stale silence
    /// cannot trigger a second restart.
    pub fn reset(&mut self) {
        self.last_heartbeat_at = None;
    }
}
