//! One command/reply round trip with a specific monitor.
//!
//! A [`MonitorSession`] borrows an open [`Transport`] and addresses a single
//! monitor.  Each method performs exactly one exchange: encode, send,
//! receive, decode.  Retry, timeouts, and locking all belong to the
//! controller above.  The session must not be used concurrently; the device
//! answers exchanges strictly one at a time.

use necme_core::protocol::codec::{decode_reply, encode_command};
use necme_core::{Command, InputTerminal, MonitorId, PowerMode, ProtocolError, Reply};
use thiserror::Error;
use tracing::debug;

use crate::transport::{Transport, TransportError};

/// Error type for session round trips.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The underlying connection failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The reply frame could not be decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A well-formed reply arrived from a monitor other than the one
    /// addressed.
    #[error("reply from monitor 0x{got:02X}, expected 0x{expected:02X}")]
    WrongMonitor { expected: u8, got: u8 },

    /// A well-formed reply decoded to a variant that does not answer the
    /// issued command.
    #[error("reply does not answer the issued command")]
    UnexpectedReply,
}

/// A borrowed view of one transport, addressing one monitor.
pub struct MonitorSession<'a> {
    transport: &'a mut Transport,
    monitor_id: MonitorId,
}

impl<'a> MonitorSession<'a> {
    pub fn new(transport: &'a mut Transport, monitor_id: MonitorId) -> Self {
        Self {
            transport,
            monitor_id,
        }
    }

    /// Commands the display on and returns the device-reported power mode.
    ///
    /// The report may be a transitional mode rather than `On`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] on transport or decode failure.
    pub async fn set_power_on(&mut self) -> Result<PowerMode, SessionError> {
        match self.exchange(&Command::SetPowerOn).await? {
            Reply::PowerSet(mode) => Ok(mode),
            _ => Err(SessionError::UnexpectedReply),
        }
    }

    /// Commands the display off and returns the device-reported power mode.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] on transport or decode failure.
    pub async fn set_power_off(&mut self) -> Result<PowerMode, SessionError> {
        match self.exchange(&Command::SetPowerOff).await? {
            Reply::PowerSet(mode) => Ok(mode),
            _ => Err(SessionError::UnexpectedReply),
        }
    }

    /// Reads the current power mode.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] on transport or decode failure.
    pub async fn read_power_status(&mut self) -> Result<PowerMode, SessionError> {
        match self.exchange(&Command::ReadPowerStatus).await? {
            Reply::PowerStatus(mode) => Ok(mode),
            _ => Err(SessionError::UnexpectedReply),
        }
    }

    /// Reads the currently selected input terminal.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] on transport or decode failure.
    pub async fn read_active_input(&mut self) -> Result<InputTerminal, SessionError> {
        match self.exchange(&Command::ReadActiveInput).await? {
            Reply::ActiveInput(terminal) => Ok(terminal),
            _ => Err(SessionError::UnexpectedReply),
        }
    }

    /// Reads the device-side name of `terminal`, exactly as sent (untrimmed).
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] on transport or decode failure.
    pub async fn read_input_name(
        &mut self,
        terminal: InputTerminal,
    ) -> Result<String, SessionError> {
        match self.exchange(&Command::ReadInputName(terminal)).await? {
            Reply::InputName { name, .. } => Ok(name),
            _ => Err(SessionError::UnexpectedReply),
        }
    }

    /// Reads the model name, exactly as sent.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] on transport or decode failure.
    pub async fn read_model_name(&mut self) -> Result<String, SessionError> {
        match self.exchange(&Command::ReadModelName).await? {
            Reply::ModelName(model) => Ok(model),
            _ => Err(SessionError::UnexpectedReply),
        }
    }

    /// Reads the serial number, exactly as sent.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] on transport or decode failure.
    pub async fn read_serial_number(&mut self) -> Result<String, SessionError> {
        match self.exchange(&Command::ReadSerialNumber).await? {
            Reply::SerialNumber(serial) => Ok(serial),
            _ => Err(SessionError::UnexpectedReply),
        }
    }

    async fn exchange(&mut self, command: &Command) -> Result<Reply, SessionError> {
        let raw = self.monitor_id.to_raw();
        debug!(monitor = %self.monitor_id, ?command, "sending command");

        let frame = encode_command(command, raw);
        self.transport.send_frame(&frame).await?;
        let reply_frame = self.transport.recv_frame().await?;
        let decoded = decode_reply(command.kind(), &reply_frame)?;
        if decoded.source_raw != raw {
            return Err(SessionError::WrongMonitor {
                expected: raw,
                got: decoded.source_raw,
            });
        }
        debug!(monitor = %self.monitor_id, reply = ?decoded.reply, "received reply");
        Ok(decoded.reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use necme_core::protocol::codec::encode_reply;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    // Accepts one connection and answers every incoming frame from `replies`
    // in order, ignoring the request bytes.
    async fn one_shot_monitor(replies: Vec<Vec<u8>>) -> (String, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 512];
            for reply in replies {
                let n = stream.read(&mut buf).await.unwrap();
                assert!(n > 0, "expected a request frame");
                stream.write_all(&reply).await.unwrap();
            }
        });
        (addr.ip().to_string(), addr.port())
    }

    fn monitor(n: u16) -> MonitorId {
        MonitorId::new(n).unwrap()
    }

    #[tokio::test]
    async fn test_read_power_status_round_trip() {
        let id = monitor(1);
        let reply = encode_reply(&Reply::PowerStatus(PowerMode::On), id.to_raw());
        let (host, port) = one_shot_monitor(vec![reply]).await;

        let mut transport = Transport::connect(&host, port).await.unwrap();
        let mut session = MonitorSession::new(&mut transport, id);
        assert_eq!(session.read_power_status().await.unwrap(), PowerMode::On);
    }

    #[tokio::test]
    async fn test_reply_from_other_monitor_is_rejected() {
        let id = monitor(1);
        // Reply claims to come from monitor 2.
        let reply = encode_reply(&Reply::PowerStatus(PowerMode::On), monitor(2).to_raw());
        let (host, port) = one_shot_monitor(vec![reply]).await;

        let mut transport = Transport::connect(&host, port).await.unwrap();
        let mut session = MonitorSession::new(&mut transport, id);
        assert!(matches!(
            session.read_power_status().await,
            Err(SessionError::WrongMonitor {
                expected: 0x41,
                got: 0x42,
            })
        ));
    }

    #[tokio::test]
    async fn test_read_input_name_returns_name_untrimmed() {
        let id = monitor(1);
        let reply = encode_reply(
            &Reply::InputName {
                terminal: InputTerminal(0x11),
                name: "HDMI1   ".to_string(),
            },
            id.to_raw(),
        );
        let (host, port) = one_shot_monitor(vec![reply]).await;

        let mut transport = Transport::connect(&host, port).await.unwrap();
        let mut session = MonitorSession::new(&mut transport, id);
        let name = session.read_input_name(InputTerminal(0x11)).await.unwrap();
        assert_eq!(name, "HDMI1   ");
    }

    #[tokio::test]
    async fn test_garbage_reply_is_protocol_error() {
        let id = monitor(1);
        let (host, port) = one_shot_monitor(vec![b"not a frame\r".to_vec()]).await;

        let mut transport = Transport::connect(&host, port).await.unwrap();
        let mut session = MonitorSession::new(&mut transport, id);
        assert!(matches!(
            session.read_power_status().await,
            Err(SessionError::Protocol(_))
        ));
    }
}
