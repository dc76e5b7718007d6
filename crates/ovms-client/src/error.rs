//! Session-level errors returned to callers

use thiserror::Error;

use crate::transport::TransportError;

#[derive(Debug, Error, Clone)]
pub enum SessionError {
    #[error("Not connected")]
    NotConnected,

    #[error("Command {0} is not supported by the vehicle")]
    CommandNotSupported(u8),

    #[error("Command text must not contain line breaks")]
    InvalidCommandText,

    #[error(transparent)]
    Transport(#[from] TransportError),
}
