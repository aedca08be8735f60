//! Monitor addressing.
//!
//! Each display on a controller is addressed by a one-byte identifier.  The
//! wire protocol carries the *raw* address byte (`0x41` for monitor 1 up to
//! `0xA4` for monitor 100); configuration and logging use the human-facing
//! ordinal in `1..=100`.  Conversion is validated here, before any byte ever
//! reaches the network.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw wire byte for monitor 1.
pub const RAW_MONITOR_BASE: u8 = 0x41;

/// Raw wire byte for monitor 100, the highest addressable monitor.
pub const RAW_MONITOR_MAX: u8 = 0xA4;

/// Raw wire byte addressing every monitor on the controller at once.
///
/// Used only by the discovery probe; regular operations always address a
/// single monitor.
pub const RAW_BROADCAST: u8 = 0x2A;

/// Raw wire byte identifying the controlling host (us) as a frame source.
pub const RAW_CONTROLLER: u8 = 0x30;

/// Errors produced when validating a monitor address.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MonitorIdError {
    /// The raw address byte is outside the protocol's monitor range.
    #[error("raw monitor address 0x{0:02X} outside valid range 0x41..=0xA4")]
    RawOutOfRange(u8),

    /// The ordinal identifier is outside `1..=100`.
    #[error("monitor id {0} outside valid range 1..=100")]
    OrdinalOutOfRange(u16),
}

/// A validated monitor identifier in the range `1..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct MonitorId(u8);

impl MonitorId {
    /// Validates a raw wire address byte and converts it to an ordinal id.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorIdError::RawOutOfRange`] for bytes outside
    /// `0x41..=0xA4`.
    pub fn try_from_raw(raw: u8) -> Result<Self, MonitorIdError> {
        if !(RAW_MONITOR_BASE..=RAW_MONITOR_MAX).contains(&raw) {
            return Err(MonitorIdError::RawOutOfRange(raw));
        }
        Ok(Self(raw - (RAW_MONITOR_BASE - 1)))
    }

    /// Validates an ordinal id in `1..=100`.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorIdError::OrdinalOutOfRange`] otherwise.
    pub fn new(ordinal: u16) -> Result<Self, MonitorIdError> {
        if !(1..=100).contains(&ordinal) {
            return Err(MonitorIdError::OrdinalOutOfRange(ordinal));
        }
        Ok(Self(ordinal as u8))
    }

    /// The ordinal identifier, `1..=100`.
    pub fn ordinal(&self) -> u8 {
        self.0
    }

    /// The raw wire address byte, `0x41..=0xA4`.
    pub fn to_raw(&self) -> u8 {
        self.0 + (RAW_MONITOR_BASE - 1)
    }
}

impl std::fmt::Display for MonitorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for MonitorId {
    type Error = MonitorIdError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MonitorId> for u16 {
    fn from(id: MonitorId) -> Self {
        id.0 as u16
    }
}
