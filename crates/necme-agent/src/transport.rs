//! TCP transport to a display's LAN control port.
//!
//! A [`Transport`] is one connection, opened fresh for every operation and
//! dropped when the operation finishes.  The displays are far more reliable
//! when each exchange gets its own connection than when one is held open
//! across their power-state transitions, so connections are never pooled.
//!
//! Frames are CR-terminated on the wire; `recv_frame` reads up to and
//! including the CR with a hard size cap.

use std::io::ErrorKind;

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

/// TCP port the displays listen on for external control.
pub const DEFAULT_CONTROL_PORT: u16 = 7142;

/// Largest frame the protocol can express: header, maximum message, BCC, CR.
const MAX_FRAME_SIZE: usize = 7 + 0xFF + 2;

const CR: u8 = 0x0D;

/// Error type for transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The TCP connection could not be established.
    #[error("failed to connect to {host}:{port}: {source}")]
    ConnectFailed {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// A read or write on an established connection failed.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The incoming byte stream exceeded the maximum frame size without a
    /// terminating CR.  The peer is not speaking this protocol.
    #[error("incoming frame exceeded {limit} bytes without a CR terminator")]
    FrameTooLong { limit: usize },

    /// The peer closed the connection mid-frame.
    #[error("connection closed by peer")]
    Closed,
}

/// One open TCP connection to a display.
pub struct Transport {
    stream: TcpStream,
}

impl Transport {
    /// Opens a new connection to `host:port`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ConnectFailed`] when the TCP connection
    /// cannot be established.
    pub async fn connect(host: &str, port: u16) -> Result<Self, TransportError> {
        let stream = TcpStream::connect((host, port)).await.map_err(|source| {
            TransportError::ConnectFailed {
                host: host.to_string(),
                port,
                source,
            }
        })?;
        stream.set_nodelay(true)?;
        debug!(host, port, "transport connected");
        Ok(Self { stream })
    }

    /// Writes one complete frame.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] on write failure.
    pub async fn send_frame(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        self.stream.write_all(frame).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Reads one frame, up to and including the CR terminator.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] if the peer disconnects before the
    /// terminator, and [`TransportError::FrameTooLong`] if the stream carries
    /// more than a protocol-maximum frame without one.
    pub async fn recv_frame(&mut self) -> Result<Vec<u8>, TransportError> {
        let mut frame = Vec::with_capacity(32);
        loop {
            let byte = match self.stream.read_u8().await {
                Ok(b) => b,
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                    return Err(TransportError::Closed)
                }
                Err(e) => return Err(TransportError::Io(e)),
            };
            frame.push(byte);
            if byte == CR {
                return Ok(frame);
            }
            if frame.len() >= MAX_FRAME_SIZE {
                return Err(TransportError::FrameTooLong {
                    limit: MAX_FRAME_SIZE,
                });
            }
        }
    }

    /// Cleanly shuts down the connection.  Errors are ignored; the socket is
    /// dropped either way.
    pub async fn shutdown(mut self) {
        let _ = self.stream.shutdown().await;
    }
}
