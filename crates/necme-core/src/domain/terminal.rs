//! Input terminal identifiers.
//!
//! A terminal is a selectable video input on a monitor (HDMI, DisplayPort,
//! VGA, ...).  The device identifies each one by a single opaque byte whose
//! meaning is model-specific; equality is byte-value equality.  A handful of
//! well-known bytes carry built-in names so the agent can offer a source
//! list before it has ever queried the display.

use serde::{Deserialize, Serialize};

/// An opaque one-byte identifier for a video input terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputTerminal(pub u8);

/// Terminals commonly present across the M/ME-series line.
pub const STANDARD_TERMINALS: &[InputTerminal] = &[
    InputTerminal(0x11),
    InputTerminal(0x12),
    InputTerminal(0x88),
    InputTerminal(0x0F),
];

impl InputTerminal {
    /// The built-in name for a well-known terminal byte, if any.
    ///
    /// Model firmware may expose more terminals than this table knows about;
    /// those are still valid, just nameless until queried from the device.
    pub fn builtin_name(&self) -> Option<&'static str> {
        match self.0 {
            0x11 => Some("HDMI1"),
            0x12 => Some("HDMI2"),
            0x88 => Some("DisplayPort"),
            0x0F => Some("VGA"),
            _ => None,
        }
    }

    /// Looks up a standard terminal by its built-in name.
    pub fn from_builtin_name(name: &str) -> Option<InputTerminal> {
        STANDARD_TERMINALS
            .iter()
            .copied()
            .find(|t| t.builtin_name() == Some(name))
    }
}

impl std::fmt::Display for InputTerminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.builtin_name() {
            Some(name) => write!(f, "{name} (0x{:02X})", self.0),
            None => write!(f, "terminal 0x{:02X}", self.0),
        }
    }
}
