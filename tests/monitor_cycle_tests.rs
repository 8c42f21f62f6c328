//! Monitor Loop State Machine Tests
//!
//! Exercises the restart-decision logic with scripted probes and a fake
//! service controller, independent of real sockets, systemctl, or wall
//! clock time. Temporal properties drive `Monitor::evaluate` with
//! explicit instants; the full `run_cycle` path is covered separately.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use mavlink_watchdog::{
    CycleOutcome, HeartbeatProbe, Monitor, MonitorConfig, ProbeResult, RestartOutcome,
    ServiceController,
};

// ============================================================================
// Fakes
// ============================================================================

/// Probe that replays a scripted sequence, then reports silence forever.
#[derive(Clone, Default)]
struct ScriptedProbe {
    results: Arc<Mutex<VecDeque<ProbeResult>>>,
}

impl ScriptedProbe {
    fn push(&self, result: ProbeResult) {
        self.results.lock().expect("probe script lock").push_back(result);
    }
}

#[async_trait]
impl HeartbeatProbe for ScriptedProbe {
    async fn probe(&self) -> ProbeResult {
        self.results
            .lock()
            .expect("probe script lock")
            .pop_front()
            .unwrap_or(ProbeResult::NoData)
    }
}

/// Probe that stalls for a fixed delay before reporting a heartbeat,
/// like a real reply arriving late in the request-timeout window.
struct SlowProbe {
    delay: Duration,
}

#[async_trait]
impl HeartbeatProbe for SlowProbe {
    async fn probe(&self) -> ProbeResult {
        tokio::time::sleep(self.delay).await;
        ProbeResult::Heartbeat
    }
}

/// Controller with a switchable active flag and a restart call counter.
#[derive(Clone)]
struct FakeController {
    active: Arc<AtomicBool>,
    fail_restart: Arc<AtomicBool>,
    restarts: Arc<AtomicUsize>,
}

impl FakeController {
    fn new(active: bool) -> Self {
        Self {
            active: Arc::new(AtomicBool::new(active)),
            fail_restart: Arc::new(AtomicBool::new(false)),
            restarts: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn restart_count(&self) -> usize {
        self.restarts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServiceController for FakeController {
    async fn is_active(&self, _service: &str) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    async fn restart(&self, _service: &str) -> RestartOutcome {
        self.restarts.fetch_add(1, Ordering::SeqCst);
        if self.fail_restart.load(Ordering::SeqCst) {
            RestartOutcome::CommandFailed {
                detail: "Job for mavlink-router.service failed".to_string(),
            }
        } else {
            RestartOutcome::Restarted
        }
    }
}

fn test_config() -> MonitorConfig {
    MonitorConfig {
        silence_threshold: Duration::from_secs(30),
        ..MonitorConfig::default()
    }
}

fn monitor(
    probe: &ScriptedProbe,
    controller: &FakeController,
) -> Monitor<ScriptedProbe, FakeController> {
    Monitor::new(test_config(), probe.clone(), controller.clone())
}

// ============================================================================
// Restart Policy
// ============================================================================

#[tokio::test]
async fn restart_fires_exactly_once_at_threshold() {
    let probe = ScriptedProbe::default();
    let controller = FakeController::new(true);
    let mut monitor = monitor(&probe, &controller);

    let t0 = Instant::now();
    let outcome = monitor.evaluate(ProbeResult::Heartbeat, t0).await;
    assert_eq!(outcome, CycleOutcome::Nominal);

    // Cycles before the threshold stay nominal.
    for secs in [5, 10, 15, 20, 25] {
        let outcome = monitor
            .evaluate(ProbeResult::NoData, t0 + Duration::from_secs(secs))
            .await;
        assert_eq!(outcome, CycleOutcome::Nominal, "no restart at t+{secs}s");
    }
    assert_eq!(controller.restart_count(), 0);

    // First cycle evaluated at the threshold triggers the restart.
    let outcome = monitor
        .evaluate(ProbeResult::NoData, t0 + Duration::from_secs(30))
        .await;
    assert_eq!(outcome, CycleOutcome::RestartTriggered);
    assert_eq!(controller.restart_count(), 1);
}

#[tokio::test]
async fn never_observed_state_never_triggers_restart() {
    let probe = ScriptedProbe::default();
    let controller = FakeController::new(true);
    let mut monitor = monitor(&probe, &controller);

    // Service active, no heartbeat ever recorded, three cycles spanning
    // far beyond the threshold.
    let t0 = Instant::now();
    for secs in [0, 60, 600] {
        let outcome = monitor
            .evaluate(ProbeResult::NoData, t0 + Duration::from_secs(secs))
            .await;
        assert_eq!(outcome, CycleOutcome::Nominal);
    }
    assert_eq!(controller.restart_count(), 0);
}

#[tokio::test]
async fn tracker_reset_prevents_back_to_back_restarts() {
    let probe = ScriptedProbe::default();
    let controller = FakeController::new(true);
    let mut monitor = monitor(&probe, &controller);

    let t0 = Instant::now();
    monitor.evaluate(ProbeResult::Heartbeat, t0).await;

    let outcome = monitor
        .evaluate(ProbeResult::NoData, t0 + Duration::from_secs(45))
        .await;
    assert_eq!(outcome, CycleOutcome::RestartTriggered);

    // The very next cycle must not re-trigger from pre-restart silence.
    let outcome = monitor
        .evaluate(ProbeResult::NoData, t0 + Duration::from_secs(50))
        .await;
    assert_eq!(outcome, CycleOutcome::Nominal);
    assert_eq!(controller.restart_count(), 1);
}

#[tokio::test]
async fn tracker_resets_even_when_restart_fails() {
    let probe = ScriptedProbe::default();
    let controller = FakeController::new(true);
    controller.fail_restart.store(true, Ordering::SeqCst);
    let mut monitor = monitor(&probe, &controller);

    let t0 = Instant::now();
    monitor.evaluate(ProbeResult::Heartbeat, t0).await;

    let outcome = monitor
        .evaluate(ProbeResult::NoData, t0 + Duration::from_secs(31))
        .await;
    assert_eq!(outcome, CycleOutcome::RestartTriggered);
    assert_eq!(controller.restart_count(), 1);

    // Clock restarted despite the failure; the next cycle re-evaluates
    // from a clean never-observed state.
    let outcome = monitor
        .evaluate(ProbeResult::NoData, t0 + Duration::from_secs(32))
        .await;
    assert_eq!(outcome, CycleOutcome::Nominal);
    assert_eq!(controller.restart_count(), 1);
}

// ============================================================================
// Service-Down Short Circuit
// ============================================================================

#[tokio::test]
async fn inactive_service_suppresses_timeout_evaluation() {
    let probe = ScriptedProbe::default();
    let controller = FakeController::new(true);
    let mut monitor = monitor(&probe, &controller);

    // A heartbeat recorded two minutes ago, so silence is far past the
    // threshold by the time the service goes down.
    let t0 = Instant::now()
        .checked_sub(Duration::from_secs(120))
        .expect("process uptime");
    monitor.evaluate(ProbeResult::Heartbeat, t0).await;

    controller.active.store(false, Ordering::SeqCst);
    let outcome = monitor.run_cycle().await;
    assert_eq!(outcome, CycleOutcome::ServiceDown);
    assert_eq!(controller.restart_count(), 0);
}

// ============================================================================
// Heartbeat Refresh
// ============================================================================

#[tokio::test]
async fn fresh_heartbeat_restarts_the_silence_clock() {
    let probe = ScriptedProbe::default();
    let controller = FakeController::new(true);
    let mut monitor = monitor(&probe, &controller);

    let t0 = Instant::now();
    monitor.evaluate(ProbeResult::Heartbeat, t0).await;

    // A new heartbeat at t+25s pushes the trigger point out to t+55s.
    monitor
        .evaluate(ProbeResult::Heartbeat, t0 + Duration::from_secs(25))
        .await;

    let outcome = monitor
        .evaluate(ProbeResult::NoData, t0 + Duration::from_secs(40))
        .await;
    assert_eq!(outcome, CycleOutcome::Nominal);
    assert_eq!(controller.restart_count(), 0);

    let outcome = monitor
        .evaluate(ProbeResult::NoData, t0 + Duration::from_secs(55))
        .await;
    assert_eq!(outcome, CycleOutcome::RestartTriggered);
    assert_eq!(controller.restart_count(), 1);
}

#[tokio::test]
async fn invalid_frames_count_as_silence() {
    let probe = ScriptedProbe::default();
    let controller = FakeController::new(true);
    let mut monitor = monitor(&probe, &controller);

    let t0 = Instant::now();
    monitor.evaluate(ProbeResult::Heartbeat, t0).await;

    // Malformed replies must not refresh the tracker.
    monitor
        .evaluate(ProbeResult::InvalidFrame, t0 + Duration::from_secs(20))
        .await;

    let outcome = monitor
        .evaluate(ProbeResult::NoData, t0 + Duration::from_secs(30))
        .await;
    assert_eq!(outcome, CycleOutcome::RestartTriggered);
}

// ============================================================================
// Full Cycle Path
// ============================================================================

#[tokio::test]
async fn run_cycle_records_heartbeat_from_probe() {
    let probe = ScriptedProbe::default();
    let controller = FakeController::new(true);
    let mut monitor = monitor(&probe, &controller);

    probe.push(ProbeResult::Heartbeat);
    assert_eq!(monitor.run_cycle().await, CycleOutcome::Nominal);

    // The heartbeat was recorded at roughly the cycle's own instant, so
    // a cycle one threshold later triggers the restart.
    let outcome = monitor
        .evaluate(ProbeResult::NoData, Instant::now() + Duration::from_secs(31))
        .await;
    assert_eq!(outcome, CycleOutcome::RestartTriggered);
    assert_eq!(controller.restart_count(), 1);
}

#[tokio::test]
async fn heartbeat_is_stamped_at_receipt_not_cycle_start() {
    // A reply that arrives late in the probe window must be stamped when
    // it is received: with a 250ms threshold and a 400ms probe delay, a
    // cycle-start timestamp would already read as expired silence.
    let config = MonitorConfig {
        silence_threshold: Duration::from_millis(250),
        ..MonitorConfig::default()
    };
    let probe = SlowProbe {
        delay: Duration::from_millis(400),
    };
    let controller = FakeController::new(true);
    let mut monitor = Monitor::new(config, probe, controller.clone());

    assert_eq!(monitor.run_cycle().await, CycleOutcome::Nominal);

    let outcome = monitor.evaluate(ProbeResult::NoData, Instant::now()).await;
    assert_eq!(outcome, CycleOutcome::Nominal);
    assert_eq!(controller.restart_count(), 0);
}
