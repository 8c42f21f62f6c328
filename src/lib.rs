//! mavlink-watchdog: liveness watchdog for a MAVLink telemetry relay.
//!
//! Probes the relay's UDP control port for heartbeat traffic, tracks how
//! long the link has been silent, and restarts the relay's systemd unit
//! when silence exceeds a configured threshold.
//!
//! ## Architecture
//!
//! - **Probe Transport**: bounded UDP request/reply against loopback
//! - **Packet Validator**: MAVLink magic-byte check on replies
//! - **Liveness Tracker**: last-heartbeat timestamp and silence arithmetic
//! - **Service Controller**: systemctl status query and privileged restart
//! - **Monitor Loop**: polling cadence, threshold evaluation, cooldown

pub mod config;
pub mod liveness;
pub mod monitor;
pub mod probe;
pub mod service;

// Re-export the configuration surface
pub use config::{ConfigError, MonitorConfig};

// Re-export the core state machine and its capability seams
pub use liveness::LivenessTracker;
pub use monitor::{CycleOutcome, Monitor};
pub use probe::{validate_frame, HeartbeatProbe, ProbeResult, UdpProbe};
pub use service::{RestartOutcome, ServiceController, SystemdController};
