//! System-wide default constants.
//!
//! Centralises every timing and addressing constant used by the watchdog.
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Probe Transport
// ============================================================================

/// UDP control port of the monitored relay when no config file overrides it.
pub const PROBE_PORT: u16 = 14_560;

/// How long a probe waits for a reply datagram (seconds).
pub const PROBE_REQUEST_TIMEOUT_SECS: u64 = 5;

// ============================================================================
// Liveness Policy
// ============================================================================

/// Silence threshold before a restart is triggered (seconds).
pub const SILENCE_THRESHOLD_SECS: u64 = 30;

// ============================================================================
// Service Controller
// ============================================================================

/// systemd unit managed by the watchdog when no config file overrides it.
pub const SERVICE_NAME: &str = "mavlink-router";

/// Bound on the `is-active` status query (seconds).
pub const STATUS_QUERY_TIMEOUT_SECS: u64 = 10;

/// Bound on the restart command (seconds).
pub const RESTART_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Monitor Loop Cadence
// ============================================================================

/// Normal polling interval between healthy cycles (seconds).
pub const POLL_INTERVAL_SECS: u64 = 5;

/// Wait applied when the monitored service itself reports not-active (seconds).
pub const SERVICE_DOWN_WAIT_SECS: u64 = 10;

/// Cooldown after issuing a restart, before resuming normal cadence (seconds).
///
/// Prevents restart storms while the relay is still settling.
pub const RESTART_COOLDOWN_SECS: u64 = 30;

// ============================================================================
// Configuration
// ============================================================================

/// Default key-value config file consumed at startup.
pub const CONFIG_PATH: &str = "/opt/mavlink/config.env";

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV_VAR: &str = "MAVWD_CONFIG";
