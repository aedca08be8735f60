//! # necme-agent
//!
//! Headless control agent for NEC M-Series and ME-Series displays.
//!
//! Layered on top of `necme-core`, bottom to top:
//!
//! - **`transport`** – One TCP connection to a display's LAN port.  Opened
//!   fresh for every operation and dropped afterwards; never pooled.
//!
//! - **`session`** – One command/reply round trip over an open transport.
//!   Encode, send, receive, decode; no retry, no locking.
//!
//! - **`controller`** – One instance per physical display.  Serializes all
//!   access behind a mutex (the device rejects interleaved exchanges),
//!   enforces read deadlines, and caches input-terminal names.
//!
//! - **`discovery`** – One-shot probe of a host to learn which monitor is
//!   attached and its model/serial identity, used before a controller for
//!   that display exists.
//!
//! - **`poller`** – Periodic state refresh with bounded retry on timeouts,
//!   feeding the agent's view of each display.
//!
//! - **`config`** – TOML file persistence for the configured display list
//!   and agent settings.

pub mod config;
pub mod controller;
pub mod discovery;
pub mod poller;
pub mod session;
pub mod transport;

pub use controller::{ControllerError, DisplayController};
pub use discovery::{discover, DiscoveryError};
pub use poller::{DisplayPoller, DisplayState, PollError};
pub use session::{MonitorSession, SessionError};
pub use transport::{Transport, TransportError, DEFAULT_CONTROL_PORT};
