//! # necme-core
//!
//! Shared library for NEC M-Series and ME-Series display control containing
//! the wire protocol codec and the pure domain types.
//!
//! This crate is used by the agent binary and by anything else that needs to
//! talk the external control protocol.  It has zero dependencies on network
//! sockets or OS APIs.
//!
//! # Architecture overview
//!
//! These displays speak a request/response protocol over TCP: every frame is
//! addressed to a single monitor on the controller, carries a command code
//! and an optional payload, and ends with a checksum.  Replies are matched to
//! requests purely by position (the device supports exactly one outstanding
//! exchange at a time), which is why everything above this crate serializes
//! access to the connection.
//!
//! - **`protocol`** – How bytes travel over the wire.  Typed commands are
//!   encoded into checksummed frames and device replies are decoded back
//!   into typed Rust values.
//!
//! - **`domain`** – Pure domain types with no I/O: monitor addresses, power
//!   modes, input terminals, and the discovered controller identity.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `necme_core::PowerMode` instead of `necme_core::domain::power::PowerMode`.
pub use domain::identity::ControllerIdentity;
pub use domain::monitor::{MonitorId, MonitorIdError};
pub use domain::power::PowerMode;
pub use domain::terminal::InputTerminal;
pub use protocol::codec::{decode_reply, encode_command, DecodedReply, ProtocolError};
pub use protocol::commands::{Command, CommandKind, Reply};
