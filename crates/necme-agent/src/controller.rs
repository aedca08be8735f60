//! Per-display controller: serialized access, deadlines, and the
//! input-name cache.
//!
//! One [`DisplayController`] exists per configured physical display.  The
//! device answers exactly one exchange at a time, so every public operation
//! holds the controller mutex for its full duration: connect, exchange,
//! disconnect.  Concurrent callers queue; they are never interleaved on the
//! wire.
//!
//! Reads are bounded by a 3 second deadline measured from the start of the
//! session exchange.  Power writes get a looser 10 second bound because the
//! display's power circuitry can stall the reply while switching state.
//!
//! Input terminal names are queried from the device once and cached for the
//! lifetime of the controller.  The cache is never evicted; display input
//! names only change through installer menus, which also restart the
//! display's control interface.

use std::collections::HashMap;
use std::time::Duration;

use necme_core::{InputTerminal, MonitorId, PowerMode};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::debug;

use crate::session::{MonitorSession, SessionError};
use crate::transport::{Transport, TransportError, DEFAULT_CONTROL_PORT};

/// Deadline for read operations, session exchange start to decoded reply.
pub const READ_DEADLINE: Duration = Duration::from_secs(3);

/// Bound on power write operations.  Looser than the read deadline; state
/// transitions can delay the device's reply by several seconds.
const WRITE_BOUND: Duration = Duration::from_secs(10);

/// Error type for controller operations.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// The display could not be reached, or the connection dropped
    /// mid-exchange.
    #[error("cannot reach display at {host}: {source}")]
    ConnectionFailure {
        host: String,
        #[source]
        source: TransportError,
    },

    /// The display did not complete the exchange within the deadline.
    #[error("monitor {monitor} did not answer {op} within {after:?}")]
    Timeout {
        op: &'static str,
        monitor: MonitorId,
        after: Duration,
    },

    /// The display answered, but the reply could not be interpreted.
    #[error("display sent an invalid reply: {0}")]
    BadReply(SessionError),
}

/// Exclusive controller for one physical display.
pub struct DisplayController {
    host: String,
    port: u16,
    monitor_id: MonitorId,
    read_deadline: Duration,
    write_bound: Duration,
    /// Guards both wire exclusivity and the name cache.
    cache: Mutex<HashMap<InputTerminal, String>>,
}

impl DisplayController {
    /// Creates a controller for the monitor at `host` on the default control
    /// port.
    pub fn new(host: impl Into<String>, monitor_id: MonitorId) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_CONTROL_PORT,
            monitor_id,
            read_deadline: READ_DEADLINE,
            write_bound: WRITE_BOUND,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Overrides the TCP control port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Overrides the read deadline.  Tests use this to avoid multi-second
    /// waits.
    pub fn with_read_deadline(mut self, deadline: Duration) -> Self {
        self.read_deadline = deadline;
        self
    }

    /// Overrides the power-write bound, like
    /// [`with_read_deadline`](Self::with_read_deadline).
    pub fn with_write_bound(mut self, bound: Duration) -> Self {
        self.write_bound = bound;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn monitor_id(&self) -> MonitorId {
        self.monitor_id
    }

    // ── Power operations ──────────────────────────────────────────────────────

    /// Turns the display on and returns the device-reported power mode,
    /// which may still be a transitional state.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError`] on connection failure, deadline expiry, or
    /// an uninterpretable reply.
    pub async fn turn_on(&self) -> Result<PowerMode, ControllerError> {
        let _guard = self.cache.lock().await;
        let mut transport = self.connect().await?;
        let result = timeout(self.write_bound, async {
            MonitorSession::new(&mut transport, self.monitor_id)
                .set_power_on()
                .await
        })
        .await;
        transport.shutdown().await;
        self.finish_write("turn on", result)
    }

    /// Turns the display off and returns the device-reported power mode.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError`] on connection failure, deadline expiry, or
    /// an uninterpretable reply.
    pub async fn turn_off(&self) -> Result<PowerMode, ControllerError> {
        let _guard = self.cache.lock().await;
        let mut transport = self.connect().await?;
        let result = timeout(self.write_bound, async {
            MonitorSession::new(&mut transport, self.monitor_id)
                .set_power_off()
                .await
        })
        .await;
        transport.shutdown().await;
        self.finish_write("turn off", result)
    }

    /// Reads the current power mode.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Timeout`] if the exchange exceeds the read
    /// deadline; no retry is attempted here.
    pub async fn power_mode(&self) -> Result<PowerMode, ControllerError> {
        let _guard = self.cache.lock().await;
        let mut transport = self.connect().await?;
        let result = timeout(self.read_deadline, async {
            MonitorSession::new(&mut transport, self.monitor_id)
                .read_power_status()
                .await
        })
        .await;
        transport.shutdown().await;
        self.finish_read("power status read", result)
    }

    /// Returns the human-readable name of the currently selected input.
    ///
    /// Reads the active terminal, then resolves its name from the cache.  On
    /// a cache miss the name is queried from the device, whitespace-trimmed,
    /// and cached; a cache hit costs no second exchange.  The deadline covers
    /// the whole operation, name lookup included.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError`] on connection failure, deadline expiry, or
    /// an uninterpretable reply.
    pub async fn active_input_name(&self) -> Result<String, ControllerError> {
        let mut cache = self.cache.lock().await;
        let mut transport = self.connect().await?;
        let result = timeout(self.read_deadline, async {
            let mut session = MonitorSession::new(&mut transport, self.monitor_id);
            let terminal = session.read_active_input().await?;
            if let Some(name) = cache.get(&terminal) {
                debug!(%terminal, name, "input name served from cache");
                return Ok(name.clone());
            }
            let raw = session.read_input_name(terminal).await?;
            let name = raw.trim().to_string();
            debug!(%terminal, name, "input name cached");
            cache.insert(terminal, name.clone());
            Ok(name)
        })
        .await;
        transport.shutdown().await;
        self.finish_read("active input read", result)
    }

    /// Snapshot of every input name learned so far, sorted.  Possibly
    /// incomplete; only terminals that have been active get queried.
    pub async fn known_input_names(&self) -> Vec<String> {
        let cache = self.cache.lock().await;
        let mut names: Vec<String> = cache.values().cloned().collect();
        names.sort();
        names
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    async fn connect(&self) -> Result<Transport, ControllerError> {
        Transport::connect(&self.host, self.port)
            .await
            .map_err(|source| ControllerError::ConnectionFailure {
                host: self.host.clone(),
                source,
            })
    }

    fn finish_read<T>(
        &self,
        op: &'static str,
        result: Result<Result<T, SessionError>, tokio::time::error::Elapsed>,
    ) -> Result<T, ControllerError> {
        self.finish(op, result, self.read_deadline)
    }

    fn finish_write<T>(
        &self,
        op: &'static str,
        result: Result<Result<T, SessionError>, tokio::time::error::Elapsed>,
    ) -> Result<T, ControllerError> {
        self.finish(op, result, self.write_bound)
    }

    fn finish<T>(
        &self,
        op: &'static str,
        result: Result<Result<T, SessionError>, tokio::time::error::Elapsed>,
        deadline: Duration,
    ) -> Result<T, ControllerError> {
        match result {
            Err(_) => Err(ControllerError::Timeout {
                op,
                monitor: self.monitor_id,
                after: deadline,
            }),
            Ok(Ok(value)) => Ok(value),
            Ok(Err(SessionError::Transport(source))) => Err(ControllerError::ConnectionFailure {
                host: self.host.clone(),
                source,
            }),
            Ok(Err(other)) => Err(ControllerError::BadReply(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_defaults() {
        let controller = DisplayController::new("10.0.0.5", MonitorId::new(1).unwrap());
        assert_eq!(controller.host(), "10.0.0.5");
        assert_eq!(controller.port, DEFAULT_CONTROL_PORT);
        assert_eq!(controller.read_deadline, READ_DEADLINE);
    }

    #[test]
    fn test_builder_overrides() {
        let controller = DisplayController::new("10.0.0.5", MonitorId::new(1).unwrap())
            .with_port(9000)
            .with_read_deadline(Duration::from_millis(50))
            .with_write_bound(Duration::from_millis(80));
        assert_eq!(controller.port, 9000);
        assert_eq!(controller.read_deadline, Duration::from_millis(50));
        assert_eq!(controller.write_bound, Duration::from_millis(80));
    }

    #[tokio::test]
    async fn test_known_input_names_starts_empty() {
        let controller = DisplayController::new("10.0.0.5", MonitorId::new(1).unwrap());
        assert!(controller.known_input_names().await.is_empty());
    }
}
