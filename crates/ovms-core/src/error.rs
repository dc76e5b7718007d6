//! Decode errors

use thiserror::Error;

/// Errors raised while applying a single message to the telemetry record
///
/// A decode error never ends a session. The message is skipped from the
/// failing field group onwards and the receive loop carries on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A numeric parameter could not be parsed
    #[error("{code} MSG Invalid: parameter {index} is not a valid number ({value:?})")]
    InvalidNumber {
        code: char,
        index: usize,
        value: String,
    },

    /// A capability token could not be parsed
    #[error("V MSG Invalid: bad capability token {0:?}")]
    InvalidCapability(String),

    /// A relative timestamp was outside the representable range
    #[error("{code} MSG Invalid: timestamp out of range ({value})")]
    TimestampOutOfRange { code: char, value: i64 },
}
