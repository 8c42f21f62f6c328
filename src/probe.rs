//! UDP heartbeat probe and MAVLink frame validation.
//!
//! Sends a fixed MAVLink-shaped request datagram to the relay's control
//! port on loopback and waits a bounded time for a reply. Absence of a
//! reply is the common case between genuine heartbeats, so timeouts and
//! transport errors are reported as [`ProbeResult::NoData`], never raised.

use std::net::Ipv4Addr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::debug;

/// MAVLink v1 frame marker.
pub const MAVLINK_V1_MAGIC: u8 = 0xFE;

/// MAVLink v2 frame marker.
pub const MAVLINK_V2_MAGIC: u8 = 0xFD;

/// Minimum plausible MAVLink frame length (header alone).
pub const MIN_FRAME_LEN: usize = 6;

/// Fixed 19-byte heartbeat-request datagram sent to the relay.
///
/// Shaped like a MAVLink v1 frame so the relay's endpoint routing will
/// answer it with heartbeat traffic.
pub const HEARTBEAT_REQUEST: [u8; 19] = [
    0xFE, 0x09, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x04, 0x05,
];

/// Outcome of a single probe cycle. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeResult {
    /// A reply arrived and passed magic-byte validation.
    Heartbeat,
    /// A reply arrived but failed validation.
    InvalidFrame,
    /// No reply within the request timeout, or a transport error.
    NoData,
}

/// Check whether a received datagram looks like a MAVLink frame.
///
/// Valid iff the buffer is at least [`MIN_FRAME_LEN`] bytes and the first
/// byte is one of the two recognized frame markers.
#[must_use]
pub fn validate_frame(data: &[u8]) -> bool {
    data.len() >= MIN_FRAME_LEN
        && matches!(data[0], MAVLINK_V1_MAGIC | MAVLINK_V2_MAGIC)
}

/// Capability seam for heartbeat probing, so the monitor state machine
/// can be exercised with a scripted fake.
#[async_trait]
pub trait HeartbeatProbe: Send + Sync {
    /// Probe the relay once for a heartbeat.
    async fn probe(&self) -> ProbeResult;
}

/// Real UDP probe against `127.0.0.1:<port>`.
pub struct UdpProbe {
    port: u16,
    request_timeout: Duration,
}

impl UdpProbe {
    #[must_use]
    pub fn new(port: u16, request_timeout: Duration) -> Self {
        Self {
            port,
            request_timeout,
        }
    }

    /// Send the request and wait for one reply datagram.
    ///
    /// The ephemeral socket is dropped before return regardless of outcome.
    async fn probe_inner(&self) -> std::io::Result<ProbeResult> {
        let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await?;
        socket
            .send_to(&HEARTBEAT_REQUEST, (Ipv4Addr::LOCALHOST, self.port))
            .await?;

        let mut buf = [0u8; 1024];
        match tokio::time::timeout(self.request_timeout, socket.recv_from(&mut buf)).await {
            Ok(Ok((n, _))) => {
                if validate_frame(&buf[..n]) {
                    Ok(ProbeResult::Heartbeat)
                } else {
                    Ok(ProbeResult::InvalidFrame)
                }
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Ok(ProbeResult::NoData),
        }
    }
}

#[async_trait]
impl HeartbeatProbe for UdpProbe {
    async fn probe(&self) -> ProbeResult {
        match self.probe_inner().await {
            Ok(result) => result,
            Err(e) => {
                debug!(error = %e, "UDP heartbeat probe failed");
                ProbeResult::NoData
            }
        }
    }
}
