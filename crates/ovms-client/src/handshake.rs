//! Challenge-response login against the relay server
//!
//! ```text
//! client -> MP-A 0 <client_token> <b64 hmac(pw, client_token)> <vehicle_id>
//! server -> MP-S 0 <server_token> <b64 hmac(pw, server_token)> ...
//! ```
//!
//! Both sides then key RC4 with `hmac(pw, server_token + client_token)`.

use subtle::ConstantTimeEq;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::crypto::{digest_b64, hmac_md5, CipherError, StreamCipher};

/// Upper bound on the server's handshake line
const MAX_RESPONSE_BYTES: u64 = 1024;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    #[error("No handshake response from server")]
    NoResponse,

    #[error("Handshake response too short: {0} fields")]
    ResponseTooShort(usize),

    #[error("Handshake response exceeds {0} bytes")]
    ResponseTooLong(u64),

    #[error("Handshake response is missing the server token or digest")]
    MissingToken,

    #[error("Server echoed the client token")]
    TokenReplay,

    #[error("Server digest does not match")]
    InvalidServerDigest,

    #[error("Handshake I/O error: {0}")]
    Io(String),

    #[error("Handshake timed out")]
    Timeout,

    #[error("Session key setup failed: {0}")]
    Cipher(#[from] CipherError),
}

/// Cipher pair for one authenticated session
#[derive(Debug)]
pub struct SessionCiphers {
    pub rx: StreamCipher,
    pub tx: StreamCipher,
}

impl SessionCiphers {
    /// Primed receive and transmit ciphers sharing one session key
    pub fn from_key(key: &[u8; 16]) -> Result<Self, HandshakeError> {
        Ok(Self {
            rx: StreamCipher::primed(key)?,
            tx: StreamCipher::primed(key)?,
        })
    }
}

pub struct HandshakeAuthenticator {
    server_password: String,
    vehicle_id: String,
}

impl HandshakeAuthenticator {
    pub fn new(server_password: impl Into<String>, vehicle_id: impl Into<String>) -> Self {
        Self {
            server_password: server_password.into(),
            vehicle_id: vehicle_id.into(),
        }
    }

    /// Login line for `client_token`, without line terminator
    pub fn request_line(&self, client_token: &str) -> Result<String, HandshakeError> {
        let digest = digest_b64(self.server_password.as_bytes(), client_token.as_bytes())?;
        Ok(format!("MP-A 0 {} {} {}", client_token, digest, self.vehicle_id))
    }

    /// Check the server's reply and derive the session key
    pub fn verify_response(
        &self,
        client_token: &str,
        response: &str,
    ) -> Result<[u8; 16], HandshakeError> {
        let fields: Vec<&str> = response.trim_end_matches(['\r', '\n']).split(' ').collect();
        if fields.len() < 4 {
            return Err(HandshakeError::ResponseTooShort(fields.len()));
        }

        let server_token = fields[2];
        let server_digest = fields[3];
        if server_token.is_empty() || server_digest.is_empty() {
            return Err(HandshakeError::MissingToken);
        }
        if server_token == client_token {
            return Err(HandshakeError::TokenReplay);
        }

        let password = self.server_password.as_bytes();
        let expected = digest_b64(password, server_token.as_bytes())?;
        if !bool::from(expected.as_bytes().ct_eq(server_digest.as_bytes())) {
            return Err(HandshakeError::InvalidServerDigest);
        }

        let mut material = String::with_capacity(server_token.len() + client_token.len());
        material.push_str(server_token);
        material.push_str(client_token);
        Ok(hmac_md5(password, material.as_bytes())?)
    }

    /// Run the exchange over a plaintext line stream
    pub async fn authenticate<R, W>(
        &self,
        client_token: &str,
        reader: &mut R,
        writer: &mut W,
    ) -> Result<SessionCiphers, HandshakeError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let request = format!("{}\r\n", self.request_line(client_token)?);
        writer.write_all(request.as_bytes()).await.map_err(io_err)?;
        writer.flush().await.map_err(io_err)?;

        let mut buf = Vec::new();
        let n = reader
            .take(MAX_RESPONSE_BYTES)
            .read_until(b'\n', &mut buf)
            .await
            .map_err(io_err)?;
        if n == 0 {
            return Err(HandshakeError::NoResponse);
        }
        if buf.last() != Some(&b'\n') {
            // Trailing bytes would be read as the first encrypted frame
            if n as u64 >= MAX_RESPONSE_BYTES {
                return Err(HandshakeError::ResponseTooLong(MAX_RESPONSE_BYTES));
            }
            return Err(HandshakeError::NoResponse);
        }

        let response = String::from_utf8_lossy(&buf);
        let key = self.verify_response(client_token, &response)?;
        debug!(vehicle = %self.vehicle_id, "Handshake accepted");
        SessionCiphers::from_key(&key)
    }
}

fn io_err(e: std::io::Error) -> HandshakeError {
    HandshakeError::Io(e.to_string())
}
