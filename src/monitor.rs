//! Monitor loop — the watchdog's restart-decision state machine.
//!
//! Each cycle checks the monitored service, probes for a heartbeat, and
//! evaluates silence against the configured threshold. The cycle is a
//! plain function over an injected probe and controller so every
//! transition is unit testable; [`Monitor::run`] adds the cadence sleeps
//! and cancellation on top.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{defaults, MonitorConfig};
use crate::liveness::LivenessTracker;
use crate::probe::{HeartbeatProbe, ProbeResult};
use crate::service::ServiceController;

/// Result of one monitoring cycle, naming the wait that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Service active, no intervention needed; resume normal cadence.
    Nominal,
    /// The monitored service is not running; timeout evaluation was
    /// skipped to avoid double-counting the failure.
    ServiceDown,
    /// Silence exceeded the threshold and a restart was issued; the
    /// tracker was reset and a cooldown follows.
    RestartTriggered,
}

impl CycleOutcome {
    /// How long the loop waits before the next cycle.
    #[must_use]
    pub fn next_wait(self) -> Duration {
        match self {
            CycleOutcome::Nominal => Duration::from_secs(defaults::POLL_INTERVAL_SECS),
            CycleOutcome::ServiceDown => Duration::from_secs(defaults::SERVICE_DOWN_WAIT_SECS),
            CycleOutcome::RestartTriggered => {
                Duration::from_secs(defaults::RESTART_COOLDOWN_SECS)
            }
        }
    }
}

/// Owns the liveness state and orchestrates probe, threshold evaluation,
/// and restart triggering for a single monitored link.
pub struct Monitor<P: HeartbeatProbe, C: ServiceController> {
    config: MonitorConfig,
    probe: P,
    controller: C,
    tracker: LivenessTracker,
}

impl<P: HeartbeatProbe, C: ServiceController> Monitor<P, C> {
    #[must_use]
    pub fn new(config: MonitorConfig, probe: P, controller: C) -> Self {
        Self {
            config,
            probe,
            controller,
            tracker: LivenessTracker::new(),
        }
    }

    /// Run one monitoring cycle: service check, probe, then evaluation.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        if !self.controller.is_active(&self.config.service_name).await {
            warn!(
                service = %self.config.service_name,
                "Monitored service is not active"
            );
            return CycleOutcome::ServiceDown;
        }

        let observed = self.probe.probe().await;
        // Sample the clock after the probe's bounded wait so a heartbeat
        // is stamped at receipt, not at cycle start.
        self.evaluate(observed, Instant::now()).await
    }

    /// Record a probe observation and apply the restart policy as of `now`.
    ///
    /// `now` is passed in rather than sampled so silence arithmetic is
    /// deterministic under test.
    pub async fn evaluate(&mut self, observed: ProbeResult, now: Instant) -> CycleOutcome {
        match observed {
            ProbeResult::Heartbeat => {
                debug!("Heartbeat detected");
                self.tracker.record_heartbeat(now);
            }
            ProbeResult::InvalidFrame => {
                debug!("Reply failed magic-byte validation, treating as silence");
            }
            ProbeResult::NoData => {}
        }

        // Restart policy evaluates only once a heartbeat has been observed.
        if let Some(silence) = self.tracker.silence_duration(now) {
            if silence >= self.config.silence_threshold {
                warn!(
                    service = %self.config.service_name,
                    silence_secs = silence.as_secs_f64(),
                    "No heartbeat past threshold, restarting service"
                );

                let outcome = self.controller.restart(&self.config.service_name).await;
                if outcome.is_success() {
                    info!(service = %self.config.service_name, "Service restarted");
                } else {
                    error!(service = %self.config.service_name, outcome = %outcome, "Restart failed");
                }

                // Clock restarts either way so a second restart cannot
                // fire on pre-restart silence.
                self.tracker.reset();
                return CycleOutcome::RestartTriggered;
            }
        }

        CycleOutcome::Nominal
    }

    /// Run the monitor until `cancel` fires.
    ///
    /// Cancellation is observed between cycles and during every wait;
    /// in-flight bounded I/O completes naturally.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            service = %self.config.service_name,
            probe_port = self.config.probe_port,
            threshold_secs = self.config.silence_threshold.as_secs(),
            "Heartbeat monitor started"
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let outcome = self.run_cycle().await;

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(outcome.next_wait()) => {}
            }
        }

        info!("Heartbeat monitor stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_schedule_matches_cadence_policy() {
        assert_eq!(CycleOutcome::Nominal.next_wait(), Duration::from_secs(5));
        assert_eq!(CycleOutcome::ServiceDown.next_wait(), Duration::from_secs(10));
        assert_eq!(
            CycleOutcome::RestartTriggered.next_wait(),
            Duration::from_secs(30)
        );
    }
}
