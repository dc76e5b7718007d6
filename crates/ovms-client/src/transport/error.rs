//! Transport layer errors

use thiserror::Error;

use crate::handshake::HandshakeError;

#[derive(Debug, Error, Clone)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Receive failed: {0}")]
    ReceiveFailed(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Handshake failed: {0}")]
    Handshake(#[from] HandshakeError),
}
