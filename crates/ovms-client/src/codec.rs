//! Line <-> message codec, including the paranoid-mode inner layer

use ovms_core::Message;
use thiserror::Error;
use tracing::debug;

use crate::crypto::{b64_decode, hmac_md5, StreamCipher};

/// Prefix of every steady-state line
pub const MARKER: &str = "MP-0 ";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Protocol violation: missing message marker in {0:?}")]
    MissingMarker(String),

    #[error("Paranoid message before any paranoid token")]
    MissingParanoidKey,

    #[error("Invalid paranoid payload: {0}")]
    InvalidParanoidPayload(String),
}

/// Per-connection codec state
///
/// Holds the paranoid-mode key once the server has sent one. Create a new
/// codec for every connection.
pub struct ProtocolCodec {
    server_password: String,
    paranoid_key: Option<[u8; 16]>,
    paranoid: bool,
}

impl ProtocolCodec {
    pub fn new(server_password: impl Into<String>) -> Self {
        Self {
            server_password: server_password.into(),
            paranoid_key: None,
            paranoid: false,
        }
    }

    /// True once any `E` message has been seen on this connection
    pub fn is_paranoid(&self) -> bool {
        self.paranoid
    }

    /// Outbound line for `msg`
    pub fn encode(msg: &Message) -> String {
        format!("{}{}", MARKER, msg.payload())
    }

    /// Decode one decrypted inbound line
    ///
    /// A paranoid token line stores the key and comes back as the outer
    /// `E` message; paranoid data lines come back as their inner message.
    pub fn decode(&mut self, line: &str) -> Result<Message, CodecError> {
        let payload = line
            .strip_prefix(MARKER)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| CodecError::MissingMarker(line.to_string()))?;

        let Some(msg) = Message::parse_payload(payload) else {
            return Err(CodecError::MissingMarker(line.to_string()));
        };
        if msg.code != 'E' {
            return Ok(msg);
        }

        if !self.paranoid {
            debug!("Server switched to paranoid mode");
            self.paranoid = true;
        }
        let inner = &payload[1..];
        Ok(self.decode_paranoid(inner)?.unwrap_or(msg))
    }

    /// Inner message of an `EM` line, `None` for an `ET` token line
    fn decode_paranoid(&mut self, data: &str) -> Result<Option<Message>, CodecError> {
        let mut chars = data.chars();
        match chars.next() {
            Some('T') => {
                let token = chars.as_str();
                let key = hmac_md5(self.server_password.as_bytes(), token.as_bytes())
                    .map_err(|e| CodecError::InvalidParanoidPayload(e.to_string()))?;
                self.paranoid_key = Some(key);
                debug!("Paranoid token received");
                Ok(None)
            }
            Some('M') => {
                let key = self.paranoid_key.ok_or(CodecError::MissingParanoidKey)?;
                let code = chars
                    .next()
                    .ok_or_else(|| CodecError::InvalidParanoidPayload("missing code".into()))?;
                let ciphertext = b64_decode(chars.as_str().trim())
                    .map_err(|e| CodecError::InvalidParanoidPayload(e.to_string()))?;

                let mut cipher = StreamCipher::primed(&key)
                    .map_err(|e| CodecError::InvalidParanoidPayload(e.to_string()))?;
                let plain = cipher.crypt(&ciphertext);
                let text = String::from_utf8_lossy(&plain);

                let params = if text.is_empty() {
                    Vec::new()
                } else {
                    text.split(',').map(str::to_string).collect()
                };
                Ok(Some(Message::new(code, params)))
            }
            other => Err(CodecError::InvalidParanoidPayload(format!(
                "unknown sub-code {:?}",
                other
            ))),
        }
    }
}
