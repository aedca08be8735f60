//! Wire protocol: typed commands/replies and the frame codec.

pub mod codec;
pub mod commands;

pub use codec::{decode_reply, encode_command, encode_reply, DecodedReply, ProtocolError};
pub use commands::{Command, CommandKind, Reply};
