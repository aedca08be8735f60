//! One-shot discovery of the monitor attached to a host.
//!
//! Discovery runs before any [`DisplayController`](crate::controller) for
//! the host exists, so it takes no lock: the flow is a single connection
//! with a probe and two identity reads, then disconnect.
//!
//! The probe is a power-status query addressed to the broadcast address.
//! Whatever monitor answers names itself in the reply's source byte; that
//! byte is range-checked and becomes the configured [`MonitorId`].  A host
//! that accepts the TCP connection but answers the probe with silence,
//! garbage, or an unsupported-operation result is some other TCP service,
//! not a display.

use std::time::Duration;

use necme_core::domain::monitor::RAW_BROADCAST;
use necme_core::protocol::codec::{decode_reply, encode_command};
use necme_core::{Command, CommandKind, ControllerIdentity, MonitorId};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::session::MonitorSession;
use crate::transport::{Transport, TransportError};

/// How long discovery waits for each reply before giving up on the host.
const PROBE_DEADLINE: Duration = Duration::from_secs(3);

/// Error type for the discovery flow.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The host did not accept a TCP connection.
    #[error("cannot connect to {host}: {source}")]
    CannotConnect {
        host: String,
        #[source]
        source: TransportError,
    },

    /// The host accepted the connection but is not a controllable display:
    /// no probe reply, a malformed reply, an unsupported-operation result,
    /// an out-of-range monitor address, or an empty identity string.
    #[error("host {host} does not speak the display control protocol: {reason}")]
    BadProtocol { host: String, reason: String },
}

/// Probes `host:port` and returns the identity of the attached monitor.
///
/// # Errors
///
/// Returns [`DiscoveryError::CannotConnect`] when the TCP connection fails
/// and [`DiscoveryError::BadProtocol`] for every in-protocol failure.
pub async fn discover(host: &str, port: u16) -> Result<ControllerIdentity, DiscoveryError> {
    discover_with_deadline(host, port, PROBE_DEADLINE).await
}

/// [`discover`] with an explicit per-reply deadline.
pub async fn discover_with_deadline(
    host: &str,
    port: u16,
    deadline: Duration,
) -> Result<ControllerIdentity, DiscoveryError> {
    let mut transport =
        Transport::connect(host, port)
            .await
            .map_err(|source| DiscoveryError::CannotConnect {
                host: host.to_string(),
                source,
            })?;

    let result = timeout(deadline, probe_and_identify(host, &mut transport)).await;
    transport.shutdown().await;

    match result {
        Err(_) => Err(bad_protocol(host, "no reply within the probe deadline")),
        Ok(identity) => identity,
    }
}

async fn probe_and_identify(
    host: &str,
    transport: &mut Transport,
) -> Result<ControllerIdentity, DiscoveryError> {
    // Broadcast probe: whichever monitor is attached answers and names
    // itself in the reply's source byte.
    let probe = encode_command(&Command::ReadPowerStatus, RAW_BROADCAST);
    transport
        .send_frame(&probe)
        .await
        .map_err(|e| bad_protocol(host, &format!("probe send failed: {e}")))?;
    let reply_frame = transport
        .recv_frame()
        .await
        .map_err(|e| bad_protocol(host, &format!("no probe reply: {e}")))?;
    let decoded = decode_reply(CommandKind::ReadPowerStatus, &reply_frame)
        .map_err(|e| bad_protocol(host, &format!("probe reply invalid: {e}")))?;
    debug!(host, source = decoded.source_raw, "probe answered");

    let monitor_id = MonitorId::try_from_raw(decoded.source_raw)
        .map_err(|e| bad_protocol(host, &format!("probe reply invalid: {e}")))?;

    let mut session = MonitorSession::new(transport, monitor_id);
    let model = session
        .read_model_name()
        .await
        .map_err(|e| bad_protocol(host, &format!("model name read failed: {e}")))?;
    let serial = session
        .read_serial_number()
        .await
        .map_err(|e| bad_protocol(host, &format!("serial number read failed: {e}")))?;

    let model = model.trim().to_string();
    let serial = serial.trim().to_string();
    if model.is_empty() {
        return Err(bad_protocol(host, "display reported an empty model name"));
    }
    if serial.is_empty() {
        return Err(bad_protocol(host, "display reported an empty serial number"));
    }

    let identity = ControllerIdentity {
        host: host.to_string(),
        monitor_id,
        model,
        serial,
    };
    info!(
        host,
        monitor = %monitor_id,
        unique_id = identity.unique_id(),
        "display discovered"
    );
    Ok(identity)
}

fn bad_protocol(host: &str, reason: &str) -> DiscoveryError {
    DiscoveryError::BadProtocol {
        host: host.to_string(),
        reason: reason.to_string(),
    }
}
