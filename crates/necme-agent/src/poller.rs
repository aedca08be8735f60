//! Periodic state refresh for one display, with bounded retry.
//!
//! A [`DisplayPoller`] wraps a shared [`DisplayController`] and keeps the
//! last observed [`DisplayState`] snapshot.  Reads that time out are retried
//! up to three attempts; the displays occasionally miss a poll while their
//! scaler is busy, and the next exchange almost always succeeds.  Connection
//! failures and invalid replies are not retried; they indicate a wrong
//! address or a misbehaving device, and hammering either helps nobody.
//!
//! A failed refresh leaves the previous snapshot values unchanged, so the
//! agent keeps reporting the last known state rather than flapping.

use std::future::Future;
use std::sync::Arc;

use necme_core::domain::terminal::STANDARD_TERMINALS;
use necme_core::PowerMode;
use thiserror::Error;
use tracing::warn;

use crate::controller::{ControllerError, DisplayController};

/// Total attempts per read before a timeout is surfaced.
const MAX_ATTEMPTS: u32 = 3;

/// Error type for poller operations.
#[derive(Debug, Error)]
pub enum PollError {
    /// Every attempt timed out.
    #[error("display timed out after {attempts} attempt(s)")]
    Timeout { attempts: u32 },

    /// A non-timeout controller failure, surfaced without retry.
    #[error(transparent)]
    Controller(#[from] ControllerError),
}

/// Last observed state of one display.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DisplayState {
    /// Power mode from the last successful read, if any.
    pub power: Option<PowerMode>,
    /// Name of the active input from the last successful read, if any.
    pub source: Option<String>,
    /// Selectable source names: the standard terminal names plus every name
    /// learned from the device so far.
    pub source_list: Vec<String>,
}

/// Polls one display and maintains its state snapshot.
pub struct DisplayPoller {
    controller: Arc<DisplayController>,
    state: DisplayState,
}

impl DisplayPoller {
    pub fn new(controller: Arc<DisplayController>) -> Self {
        Self {
            controller,
            state: DisplayState::default(),
        }
    }

    /// The last observed state.
    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    /// Refreshes power mode and active source from the device.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::Timeout`] after [`MAX_ATTEMPTS`] timed-out
    /// attempts, or [`PollError::Controller`] immediately for any other
    /// failure.  Snapshot fields not successfully read keep their previous
    /// values.
    pub async fn refresh(&mut self) -> Result<(), PollError> {
        let power = with_retry(|| self.controller.power_mode()).await?;
        self.state.power = Some(power);

        let source = with_retry(|| self.controller.active_input_name()).await?;
        self.state.source = Some(source);

        let mut list: Vec<String> = STANDARD_TERMINALS
            .iter()
            .filter_map(|t| t.builtin_name().map(str::to_string))
            .collect();
        for name in self.controller.known_input_names().await {
            if !list.contains(&name) {
                list.push(name);
            }
        }
        self.state.source_list = list;
        Ok(())
    }

    /// Turns the display on and records the device-reported mode.
    ///
    /// Power writes are issued exactly once; only the state reads in
    /// [`refresh`](Self::refresh) get the retry loop.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::Controller`] on any controller failure.
    pub async fn turn_on(&mut self) -> Result<(), PollError> {
        let mode = self.controller.turn_on().await?;
        self.state.power = Some(mode);
        Ok(())
    }

    /// Turns the display off and records the device-reported mode.  Issued
    /// exactly once, like [`turn_on`](Self::turn_on).
    ///
    /// # Errors
    ///
    /// Returns [`PollError::Controller`] on any controller failure.
    pub async fn turn_off(&mut self) -> Result<(), PollError> {
        let mode = self.controller.turn_off().await?;
        self.state.power = Some(mode);
        Ok(())
    }
}

/// Runs `op` until it succeeds, retrying timeouts only, up to
/// [`MAX_ATTEMPTS`] total attempts.
async fn with_retry<T, F, Fut>(mut op: F) -> Result<T, PollError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ControllerError>>,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(ControllerError::Timeout { .. }) if attempts < MAX_ATTEMPTS => {
                warn!(attempts, "display read timed out, retrying");
            }
            Err(ControllerError::Timeout { .. }) => {
                return Err(PollError::Timeout { attempts })
            }
            Err(other) => return Err(PollError::Controller(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::time::Duration;

    fn timeout_err() -> ControllerError {
        ControllerError::Timeout {
            op: "power status read",
            monitor: necme_core::MonitorId::new(1).unwrap(),
            after: Duration::from_secs(3),
        }
    }

    #[tokio::test]
    async fn test_with_retry_succeeds_after_two_timeouts() {
        let calls = Cell::new(0u32);
        let result = with_retry(|| {
            calls.set(calls.get() + 1);
            let attempt = calls.get();
            async move {
                if attempt < 3 {
                    Err(timeout_err())
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_with_retry_gives_up_after_three_timeouts() {
        let calls = Cell::new(0u32);
        let result: Result<(), PollError> = with_retry(|| {
            calls.set(calls.get() + 1);
            async { Err(timeout_err()) }
        })
        .await;
        assert!(matches!(result, Err(PollError::Timeout { attempts: 3 })));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_with_retry_does_not_retry_connection_failures() {
        let calls = Cell::new(0u32);
        let result: Result<(), PollError> = with_retry(|| {
            calls.set(calls.get() + 1);
            async {
                Err(ControllerError::ConnectionFailure {
                    host: "10.0.0.5".to_string(),
                    source: crate::transport::TransportError::Closed,
                })
            }
        })
        .await;
        assert!(matches!(result, Err(PollError::Controller(_))));
        assert_eq!(calls.get(), 1, "connection failures must not be retried");
    }

    #[test]
    fn test_default_state_is_unknown() {
        let state = DisplayState::default();
        assert_eq!(state.power, None);
        assert_eq!(state.source, None);
        assert!(state.source_list.is_empty());
    }
}
