//! Frame codec for the M/ME-series external control protocol.
//!
//! Wire format of every frame, request and reply alike:
//!
//! ```text
//! [SOH][rsv '0'][dest][src][type][len_hi][len_lo][STX body ETX][BCC][CR]
//! ```
//!
//! - `dest`/`src` are raw address bytes: `0x41..=0xA4` for monitors, `0x30`
//!   for the controller, `0x2A` (`*`) for broadcast.
//! - `len_hi`/`len_lo` are two ASCII-hex digits giving the message length,
//!   STX through ETX inclusive.
//! - `BCC` is the XOR of every byte after SOH up to and including ETX.
//! - The body is ASCII: hex-encoded operation codes and parameters, with
//!   name/model/serial payloads carried as raw text.
//!
//! Reply bodies open with a two-digit result code: `00` success, `01`
//! unsupported operation.  The latter decodes to
//! [`ProtocolError::UnsupportedProperty`], which callers treat differently
//! from a malformed frame (discovery aborts instead of retrying).
//!
//! This module is stateless and performs no I/O.

use thiserror::Error;
use tracing::trace;

use crate::domain::monitor::RAW_CONTROLLER;
use crate::domain::power::PowerMode;
use crate::domain::terminal::InputTerminal;
use crate::protocol::commands::{
    Command, CommandKind, Reply, OP_ACTIVE_INPUT, OP_INPUT_NAME, OP_MODEL_NAME, OP_POWER_CONTROL,
    OP_POWER_STATUS, OP_SERIAL_NUMBER,
};

// ── Frame constants ───────────────────────────────────────────────────────────

const SOH: u8 = 0x01;
const RSV: u8 = 0x30;
const STX: u8 = 0x02;
const ETX: u8 = 0x03;
const CR: u8 = 0x0D;

/// Fixed header size: SOH + reserved + dest + src + type + two length digits.
const HEADER_SIZE: usize = 7;

/// Smallest decodable frame: header + STX + result code + ETX + BCC + CR.
const MIN_FRAME: usize = HEADER_SIZE + 4 + 2;

/// Power-control parameter selecting the ON state.
const PARAM_POWER_ON: &str = "0001";
/// Power-control parameter selecting the OFF state.
const PARAM_POWER_OFF: &str = "0004";

/// Reply result code: success.
const RESULT_OK: u8 = 0x00;
/// Reply result code: the monitor does not implement this operation.
const RESULT_UNSUPPORTED: u8 = 0x01;

// ── Error type ────────────────────────────────────────────────────────────────

/// Errors that can occur while decoding a reply frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The byte slice is shorter than the minimum decodable frame.
    #[error("truncated frame: need at least {needed} bytes, got {available}")]
    Truncated { needed: usize, available: usize },

    /// A fixed framing byte (SOH, reserved, STX, ETX, CR) is wrong, or the
    /// reply is not addressed to the controller.
    #[error("bad framing: {0}")]
    BadFraming(&'static str),

    /// The declared message length does not match the bytes on the wire.
    #[error("length mismatch: header declares {declared}, frame carries {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    /// The block check character does not match the frame contents.
    #[error("checksum mismatch: frame carries 0x{carried:02X}, computed 0x{computed:02X}")]
    ChecksumMismatch { carried: u8, computed: u8 },

    /// The frame type byte is not the reply type for the issued command.
    #[error("unexpected reply type: expected 0x{expected:02X}, got 0x{got:02X}")]
    UnexpectedReplyType { expected: u8, got: u8 },

    /// The monitor explicitly declined the operation as unsupported.
    #[error("monitor does not support the requested operation")]
    UnsupportedProperty,

    /// The body could not be parsed (non-hex digit, wrong opcode echo,
    /// unknown value, invalid text).
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// A successfully decoded reply together with the responding monitor's raw
/// source address byte.
///
/// The source byte matters to discovery, which probes with a broadcast
/// destination and identifies the attached monitor from whoever answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedReply {
    /// Raw address byte of the monitor that sent the reply.
    pub source_raw: u8,
    /// The typed reply value.
    pub reply: Reply,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a [`Command`] into a complete wire frame addressed to `dest_raw`.
///
/// `dest_raw` is a raw monitor address byte (`MonitorId::to_raw`) or
/// [`RAW_BROADCAST`](crate::domain::monitor::RAW_BROADCAST) for the discovery
/// probe.  Pure and total for valid inputs.
pub fn encode_command(command: &Command, dest_raw: u8) -> Vec<u8> {
    let mut body = Vec::new();
    match command {
        Command::SetPowerOn => {
            body.extend_from_slice(OP_POWER_CONTROL.as_bytes());
            body.extend_from_slice(PARAM_POWER_ON.as_bytes());
        }
        Command::SetPowerOff => {
            body.extend_from_slice(OP_POWER_CONTROL.as_bytes());
            body.extend_from_slice(PARAM_POWER_OFF.as_bytes());
        }
        Command::ReadPowerStatus => body.extend_from_slice(OP_POWER_STATUS.as_bytes()),
        Command::ReadActiveInput => body.extend_from_slice(OP_ACTIVE_INPUT.as_bytes()),
        Command::ReadInputName(terminal) => {
            body.extend_from_slice(OP_INPUT_NAME.as_bytes());
            push_hex_u8(&mut body, terminal.0);
        }
        Command::ReadModelName => body.extend_from_slice(OP_MODEL_NAME.as_bytes()),
        Command::ReadSerialNumber => body.extend_from_slice(OP_SERIAL_NUMBER.as_bytes()),
    }
    build_frame(dest_raw, RAW_CONTROLLER, command.frame_type(), &body)
}

/// Encodes a successful [`Reply`] frame as the device would send it.
///
/// The controller never sends replies itself; this exists for the device
/// side of tests and simulators, and keeps encode/decode verifiable as a
/// pair.
pub fn encode_reply(reply: &Reply, source_raw: u8) -> Vec<u8> {
    let mut body = Vec::new();
    push_hex_u8(&mut body, RESULT_OK);
    match reply {
        Reply::PowerSet(mode) => {
            body.extend_from_slice(OP_POWER_CONTROL.as_bytes());
            push_hex_u16(&mut body, *mode as u16);
        }
        Reply::PowerStatus(mode) => {
            body.extend_from_slice(OP_POWER_STATUS.as_bytes());
            push_hex_u16(&mut body, *mode as u16);
        }
        Reply::ActiveInput(terminal) => {
            body.extend_from_slice(OP_ACTIVE_INPUT.as_bytes());
            push_hex_u16(&mut body, terminal.0 as u16);
        }
        Reply::InputName { terminal, name } => {
            body.extend_from_slice(OP_INPUT_NAME.as_bytes());
            push_hex_u8(&mut body, terminal.0);
            body.extend_from_slice(name.as_bytes());
        }
        Reply::ModelName(model) => {
            body.extend_from_slice(OP_MODEL_NAME.as_bytes());
            body.extend_from_slice(model.as_bytes());
        }
        Reply::SerialNumber(serial) => {
            body.extend_from_slice(OP_SERIAL_NUMBER.as_bytes());
            body.extend_from_slice(serial.as_bytes());
        }
    }
    build_frame(
        RAW_CONTROLLER,
        source_raw,
        reply.kind().reply_frame_type(),
        &body,
    )
}

/// Encodes an unsupported-operation reply for `kind`, as the device would.
pub fn encode_unsupported_reply(kind: CommandKind, source_raw: u8) -> Vec<u8> {
    let mut body = Vec::new();
    push_hex_u8(&mut body, RESULT_UNSUPPORTED);
    body.extend_from_slice(opcode_for(kind).as_bytes());
    build_frame(RAW_CONTROLLER, source_raw, kind.reply_frame_type(), &body)
}

/// Decodes one reply frame for a previously issued command of `kind`.
///
/// # Errors
///
/// Returns [`ProtocolError`] for truncated or malformed frames, checksum
/// failures, reply-type mismatches, and explicit unsupported-operation
/// results.
pub fn decode_reply(kind: CommandKind, bytes: &[u8]) -> Result<DecodedReply, ProtocolError> {
    if bytes.len() < MIN_FRAME {
        return Err(ProtocolError::Truncated {
            needed: MIN_FRAME,
            available: bytes.len(),
        });
    }
    if bytes[0] != SOH {
        return Err(ProtocolError::BadFraming("frame does not start with SOH"));
    }
    if bytes[1] != RSV {
        return Err(ProtocolError::BadFraming("bad reserved byte"));
    }
    if bytes[bytes.len() - 1] != CR {
        return Err(ProtocolError::BadFraming("frame does not end with CR"));
    }
    if bytes[2] != RAW_CONTROLLER {
        return Err(ProtocolError::BadFraming(
            "reply not addressed to the controller",
        ));
    }
    let source_raw = bytes[3];

    let expected_type = kind.reply_frame_type();
    if bytes[4] != expected_type {
        return Err(ProtocolError::UnexpectedReplyType {
            expected: expected_type,
            got: bytes[4],
        });
    }

    let declared = (hex_val(bytes[5])? as usize) << 4 | hex_val(bytes[6])? as usize;
    let actual = bytes.len() - HEADER_SIZE - 2;
    if declared != actual {
        return Err(ProtocolError::LengthMismatch { declared, actual });
    }

    let message = &bytes[HEADER_SIZE..HEADER_SIZE + declared];
    if message.first() != Some(&STX) || message.last() != Some(&ETX) {
        return Err(ProtocolError::BadFraming("message not delimited by STX/ETX"));
    }

    let carried = bytes[HEADER_SIZE + declared];
    let computed = bcc(&bytes[1..HEADER_SIZE + declared]);
    if carried != computed {
        return Err(ProtocolError::ChecksumMismatch { carried, computed });
    }

    let body = &message[1..message.len() - 1];
    trace!(?kind, source = source_raw, body_len = body.len(), "decoding reply body");

    let result = read_hex_u8(body, 0)?;
    match result {
        RESULT_OK => {}
        RESULT_UNSUPPORTED => return Err(ProtocolError::UnsupportedProperty),
        other => {
            return Err(ProtocolError::MalformedPayload(format!(
                "unknown result code 0x{other:02X}"
            )))
        }
    }

    let reply = decode_body(kind, &body[2..])?;
    Ok(DecodedReply { source_raw, reply })
}

// ── Body decoding ─────────────────────────────────────────────────────────────

fn decode_body(kind: CommandKind, body: &[u8]) -> Result<Reply, ProtocolError> {
    match kind {
        CommandKind::SetPower => {
            let rest = expect_opcode(body, OP_POWER_CONTROL)?;
            Ok(Reply::PowerSet(parse_power_mode(rest)?))
        }
        CommandKind::ReadPowerStatus => {
            let rest = expect_opcode(body, OP_POWER_STATUS)?;
            Ok(Reply::PowerStatus(parse_power_mode(rest)?))
        }
        CommandKind::ReadActiveInput => {
            let rest = expect_opcode(body, OP_ACTIVE_INPUT)?;
            let value = read_hex_u16(rest, 0)?;
            if value > 0xFF {
                return Err(ProtocolError::MalformedPayload(format!(
                    "input terminal value 0x{value:04X} exceeds one byte"
                )));
            }
            Ok(Reply::ActiveInput(InputTerminal(value as u8)))
        }
        CommandKind::ReadInputName => {
            let rest = expect_opcode(body, OP_INPUT_NAME)?;
            let terminal = InputTerminal(read_hex_u8(rest, 0)?);
            let name = parse_text(&rest[2..])?;
            Ok(Reply::InputName { terminal, name })
        }
        CommandKind::ReadModelName => {
            let rest = expect_opcode(body, OP_MODEL_NAME)?;
            Ok(Reply::ModelName(parse_text(rest)?))
        }
        CommandKind::ReadSerialNumber => {
            let rest = expect_opcode(body, OP_SERIAL_NUMBER)?;
            Ok(Reply::SerialNumber(parse_text(rest)?))
        }
    }
}

fn parse_power_mode(rest: &[u8]) -> Result<PowerMode, ProtocolError> {
    let value = read_hex_u16(rest, 0)?;
    PowerMode::try_from(value)
        .map_err(|_| ProtocolError::MalformedPayload(format!("unknown power mode 0x{value:04X}")))
}

fn parse_text(bytes: &[u8]) -> Result<String, ProtocolError> {
    std::str::from_utf8(bytes)
        .map(|s| s.to_string())
        .map_err(|e| ProtocolError::MalformedPayload(format!("invalid text payload: {e}")))
}

fn opcode_for(kind: CommandKind) -> &'static str {
    match kind {
        CommandKind::SetPower => OP_POWER_CONTROL,
        CommandKind::ReadPowerStatus => OP_POWER_STATUS,
        CommandKind::ReadActiveInput => OP_ACTIVE_INPUT,
        CommandKind::ReadInputName => OP_INPUT_NAME,
        CommandKind::ReadModelName => OP_MODEL_NAME,
        CommandKind::ReadSerialNumber => OP_SERIAL_NUMBER,
    }
}

// ── Frame assembly and utility helpers ────────────────────────────────────────

fn build_frame(dest: u8, src: u8, frame_type: u8, body: &[u8]) -> Vec<u8> {
    let message_len = body.len() + 2; // STX + body + ETX
    debug_assert!(message_len <= 0xFF, "message body too long for length field");

    let mut frame = Vec::with_capacity(HEADER_SIZE + message_len + 2);
    frame.push(SOH);
    frame.push(RSV);
    frame.push(dest);
    frame.push(src);
    frame.push(frame_type);
    frame.push(hex_digit((message_len >> 4) as u8));
    frame.push(hex_digit((message_len & 0x0F) as u8));
    frame.push(STX);
    frame.extend_from_slice(body);
    frame.push(ETX);
    let checksum = bcc(&frame[1..]);
    frame.push(checksum);
    frame.push(CR);
    frame
}

/// XOR block check over `bytes` (everything after SOH through ETX).
fn bcc(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

fn hex_digit(nibble: u8) -> u8 {
    match nibble {
        0..=9 => b'0' + nibble,
        10..=15 => b'A' + nibble - 10,
        _ => unreachable!("nibble out of range"),
    }
}

fn hex_val(digit: u8) -> Result<u8, ProtocolError> {
    match digit {
        b'0'..=b'9' => Ok(digit - b'0'),
        b'A'..=b'F' => Ok(digit - b'A' + 10),
        b'a'..=b'f' => Ok(digit - b'a' + 10),
        other => Err(ProtocolError::MalformedPayload(format!(
            "expected hex digit, got 0x{other:02X}"
        ))),
    }
}

fn push_hex_u8(buf: &mut Vec<u8>, value: u8) {
    buf.push(hex_digit(value >> 4));
    buf.push(hex_digit(value & 0x0F));
}

fn push_hex_u16(buf: &mut Vec<u8>, value: u16) {
    push_hex_u8(buf, (value >> 8) as u8);
    push_hex_u8(buf, (value & 0xFF) as u8);
}

fn read_hex_u8(buf: &[u8], offset: usize) -> Result<u8, ProtocolError> {
    if buf.len() < offset + 2 {
        return Err(ProtocolError::MalformedPayload(format!(
            "need 2 hex digits at offset {offset}, got {}",
            buf.len().saturating_sub(offset)
        )));
    }
    Ok(hex_val(buf[offset])? << 4 | hex_val(buf[offset + 1])?)
}

fn read_hex_u16(buf: &[u8], offset: usize) -> Result<u16, ProtocolError> {
    let hi = read_hex_u8(buf, offset)? as u16;
    let lo = read_hex_u8(buf, offset + 2)? as u16;
    Ok(hi << 8 | lo)
}

fn expect_opcode<'a>(body: &'a [u8], opcode: &str) -> Result<&'a [u8], ProtocolError> {
    let op = opcode.as_bytes();
    if body.len() < op.len() || &body[..op.len()] != op {
        return Err(ProtocolError::MalformedPayload(format!(
            "reply does not echo opcode {opcode}"
        )));
    }
    Ok(&body[op.len()..])
}

// ── Tests ─────────────────────────────────────────────────────────────────────
