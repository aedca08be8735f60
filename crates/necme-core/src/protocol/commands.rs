//! Typed command and reply values carried by the wire frames.
//!
//! The command set is a closed enum so that the codec's encode/decode pairing
//! is exhaustively checked at compile time.  Operation codes are opaque
//! device constants; they are defined here once and never derived.

use crate::domain::power::PowerMode;
use crate::domain::terminal::InputTerminal;

// ── Frame type bytes ──────────────────────────────────────────────────────────

/// Frame type byte: command addressed to a monitor.
pub const TYPE_COMMAND: u8 = b'A';
/// Frame type byte: reply to a command frame.
pub const TYPE_COMMAND_REPLY: u8 = b'B';
/// Frame type byte: parameter read addressed to a monitor.
pub const TYPE_GET_PARAMETER: u8 = b'C';
/// Frame type byte: reply to a parameter read.
pub const TYPE_GET_PARAMETER_REPLY: u8 = b'D';

// ── Operation codes (ASCII-hex strings inside the message body) ───────────────

/// Power status read.
pub const OP_POWER_STATUS: &str = "01D6";
/// Power state control; followed by a 4-digit mode parameter.
pub const OP_POWER_CONTROL: &str = "C203D6";
/// Active input terminal, as a parameter opcode.
pub const OP_ACTIVE_INPUT: &str = "0060";
/// Input terminal name read; followed by a 2-digit terminal byte.
pub const OP_INPUT_NAME: &str = "C215";
/// Serial number read.
pub const OP_SERIAL_NUMBER: &str = "C216";
/// Model name read.
pub const OP_MODEL_NAME: &str = "C217";

// ── Commands ──────────────────────────────────────────────────────────────────

/// A command the controller can send to one monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetPowerOn,
    SetPowerOff,
    ReadPowerStatus,
    ReadActiveInput,
    ReadInputName(InputTerminal),
    ReadModelName,
    ReadSerialNumber,
}

/// Discriminant for [`Command`], used to pick the decoder for a reply.
///
/// `SetPowerOn` and `SetPowerOff` share a kind because the device answers
/// both with the same reply shape (the resulting power mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    SetPower,
    ReadPowerStatus,
    ReadActiveInput,
    ReadInputName,
    ReadModelName,
    ReadSerialNumber,
}

impl Command {
    /// Returns the [`CommandKind`] discriminant for this command.
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::SetPowerOn | Command::SetPowerOff => CommandKind::SetPower,
            Command::ReadPowerStatus => CommandKind::ReadPowerStatus,
            Command::ReadActiveInput => CommandKind::ReadActiveInput,
            Command::ReadInputName(_) => CommandKind::ReadInputName,
            Command::ReadModelName => CommandKind::ReadModelName,
            Command::ReadSerialNumber => CommandKind::ReadSerialNumber,
        }
    }

    /// The frame type byte this command travels under.
    pub fn frame_type(&self) -> u8 {
        match self {
            Command::ReadActiveInput => TYPE_GET_PARAMETER,
            _ => TYPE_COMMAND,
        }
    }
}

impl CommandKind {
    /// The frame type byte expected on the reply to this kind of command.
    pub fn reply_frame_type(&self) -> u8 {
        match self {
            CommandKind::ReadActiveInput => TYPE_GET_PARAMETER_REPLY,
            _ => TYPE_COMMAND_REPLY,
        }
    }
}

// ── Replies ───────────────────────────────────────────────────────────────────

/// A decoded device reply, one variant per [`CommandKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Resulting power mode after a power control command.
    PowerSet(PowerMode),
    /// Current power mode.
    PowerStatus(PowerMode),
    /// Currently selected input terminal.
    ActiveInput(InputTerminal),
    /// Device-side name of one input terminal, exactly as sent (untrimmed).
    InputName {
        terminal: InputTerminal,
        name: String,
    },
    /// Model name string, exactly as sent.
    ModelName(String),
    /// Serial number string, exactly as sent.
    SerialNumber(String),
}

impl Reply {
    /// Returns the [`CommandKind`] this reply answers.
    pub fn kind(&self) -> CommandKind {
        match self {
            Reply::PowerSet(_) => CommandKind::SetPower,
            Reply::PowerStatus(_) => CommandKind::ReadPowerStatus,
            Reply::ActiveInput(_) => CommandKind::ReadActiveInput,
            Reply::InputName { .. } => CommandKind::ReadInputName,
            Reply::ModelName(_) => CommandKind::ReadModelName,
            Reply::SerialNumber(_) => CommandKind::ReadSerialNumber,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_commands_share_a_kind() {
        assert_eq!(Command::SetPowerOn.kind(), CommandKind::SetPower);
        assert_eq!(Command::SetPowerOff.kind(), CommandKind::SetPower);
    }

    #[test]
    fn test_active_input_uses_parameter_frames() {
        assert_eq!(Command::ReadActiveInput.frame_type(), TYPE_GET_PARAMETER);
        assert_eq!(
            CommandKind::ReadActiveInput.reply_frame_type(),
            TYPE_GET_PARAMETER_REPLY
        );
    }

    #[test]
    fn test_other_commands_use_command_frames() {
        assert_eq!(Command::ReadModelName.frame_type(), TYPE_COMMAND);
        assert_eq!(
            CommandKind::ReadModelName.reply_frame_type(),
            TYPE_COMMAND_REPLY
        );
    }

    #[test]
    fn test_reply_kind_matches_command_kind() {
        let reply = Reply::InputName {
            terminal: InputTerminal(0x11),
            name: "HDMI1".to_string(),
        };
        assert_eq!(reply.kind(), CommandKind::ReadInputName);
    }
}
