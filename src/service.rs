//! Service controller — queries and restarts the monitored systemd unit.
//!
//! Both operations are bounded by explicit timeouts and never propagate
//! errors upward: a failed status query is conservatively reported as
//! "not active", and a failed restart is returned as a [`RestartOutcome`]
//! carrying the command's diagnostic text.

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::warn;

use crate::config::defaults;

/// Result of a restart attempt. Drives logging only; no retry state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestartOutcome {
    /// Restart command exited successfully.
    Restarted,
    /// Command ran but exited non-zero; carries its stderr output.
    CommandFailed { detail: String },
    /// The controller itself could not be invoked (spawn error, timeout).
    ControllerUnavailable { detail: String },
}

impl RestartOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, RestartOutcome::Restarted)
    }
}

impl std::fmt::Display for RestartOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RestartOutcome::Restarted => write!(f, "restarted"),
            RestartOutcome::CommandFailed { detail } => {
                write!(f, "restart command failed: {detail}")
            }
            RestartOutcome::ControllerUnavailable { detail } => {
                write!(f, "service controller unavailable: {detail}")
            }
        }
    }
}

/// Capability seam over the OS service manager, so the monitor state
/// machine can be tested without invoking systemctl.
#[async_trait]
pub trait ServiceController: Send + Sync {
    /// Whether the service is currently running. Query failures are
    /// treated as "not active" and logged, never raised.
    async fn is_active(&self, service: &str) -> bool;

    /// Issue a privileged restart of the service.
    async fn restart(&self, service: &str) -> RestartOutcome;
}

/// Real controller backed by `systemctl`.
pub struct SystemdController {
    status_timeout: Duration,
    restart_timeout: Duration,
}

impl Default for SystemdController {
    fn default() -> Self {
        Self {
            status_timeout: Duration::from_secs(defaults::STATUS_QUERY_TIMEOUT_SECS),
            restart_timeout: Duration::from_secs(defaults::RESTART_TIMEOUT_SECS),
        }
    }
}

impl SystemdController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ServiceController for SystemdController {
    async fn is_active(&self, service: &str) -> bool {
        let query = Command::new("systemctl")
            .args(["is-active", service])
            .output();

        match tokio::time::timeout(self.status_timeout, query).await {
            Ok(Ok(output)) => String::from_utf8_lossy(&output.stdout).trim() == "active",
            Ok(Err(e)) => {
                warn!(service, error = %e, "Failed to query service status");
                false
            }
            Err(_) => {
                warn!(
                    service,
                    timeout_secs = self.status_timeout.as_secs(),
                    "Service status query timed out"
                );
                false
            }
        }
    }

    async fn restart(&self, service: &str) -> RestartOutcome {
        let restart = Command::new("sudo")
            .args(["systemctl", "restart", service])
            .output();

        match tokio::time::timeout(self.restart_timeout, restart).await {
            Ok(Ok(output)) if output.status.success() => RestartOutcome::Restarted,
            Ok(Ok(output)) => RestartOutcome::CommandFailed {
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            },
            Ok(Err(e)) => RestartOutcome::ControllerUnavailable {
                detail: e.to_string(),
            },
            Err(_) => RestartOutcome::ControllerUnavailable {
                detail: format!(
                    "restart command exceeded {}s",
                    self.restart_timeout.as_secs()
                ),
            },
        }
    }
}
