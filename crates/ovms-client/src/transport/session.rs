//! Authenticated relay connection

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, info, trace};

use super::TransportError;
use crate::config::{Credentials, SessionConfig};
use crate::crypto::{b64_decode, b64_encode, generate_token, StreamCipher};
use crate::handshake::{HandshakeAuthenticator, HandshakeError};

/// Longest accepted inbound line, terminator included
pub const MAX_LINE_BYTES: u64 = 64 * 1024;

/// Read side of the connection; owned by the session loop
pub struct LineReader {
    reader: BufReader<OwnedReadHalf>,
    rx: Option<StreamCipher>,
}

impl LineReader {
    pub fn new(reader: BufReader<OwnedReadHalf>, rx: Option<StreamCipher>) -> Self {
        Self { reader, rx }
    }

    /// Next line with CRLF stripped, decrypted when a cipher is active
    ///
    /// EOF is reported as `ConnectionClosed`. A line that is not valid
    /// base64 leaves the cipher out of step with the server, so it is
    /// reported as `InvalidFrame` and the connection must be dropped.
    pub async fn receive_line(&mut self) -> Result<String, TransportError> {
        let mut buf = Vec::new();
        let n = (&mut self.reader)
            .take(MAX_LINE_BYTES)
            .read_until(b'\n', &mut buf)
            .await
            .map_err(|e| TransportError::ReceiveFailed(e.to_string()))?;

        if n == 0 {
            return Err(TransportError::ConnectionClosed);
        }
        if buf.last() != Some(&b'\n') {
            if n as u64 >= MAX_LINE_BYTES {
                return Err(TransportError::InvalidFrame(format!(
                    "line exceeds {} bytes",
                    MAX_LINE_BYTES
                )));
            }
            return Err(TransportError::ConnectionClosed);
        }
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }

        let plain = match self.rx.as_mut() {
            Some(rx) => {
                let text = std::str::from_utf8(&buf)
                    .map_err(|_| TransportError::InvalidFrame("non-ASCII frame".into()))?;
                let cipher_bytes = b64_decode(text.trim())
                    .map_err(|e| TransportError::InvalidFrame(e.to_string()))?;
                rx.crypt(&cipher_bytes)
            }
            None => buf,
        };

        let line = String::from_utf8_lossy(&plain).into_owned();
        trace!(%line, "RX");
        Ok(line)
    }
}

struct WriterState {
    half: Option<OwnedWriteHalf>,
    tx: Option<StreamCipher>,
}

/// Write side of the connection
///
/// Shared between the keep-alive task and command callers. The lock covers
/// both encryption and the socket write.
pub struct LineWriter {
    state: Mutex<WriterState>,
}

impl LineWriter {
    pub fn new(half: OwnedWriteHalf, tx: Option<StreamCipher>) -> Self {
        Self {
            state: Mutex::new(WriterState {
                half: Some(half),
                tx,
            }),
        }
    }

    pub async fn transmit_line(&self, text: &str) -> Result<(), TransportError> {
        let mut state = self.state.lock().await;
        let WriterState { half, tx } = &mut *state;
        let half = half.as_mut().ok_or(TransportError::ConnectionClosed)?;

        trace!(line = %text, "TX");
        let mut frame = match tx.as_mut() {
            Some(tx) => b64_encode(&tx.crypt(text.as_bytes())),
            None => text.to_string(),
        };
        frame.push_str("\r\n");

        half.write_all(frame.as_bytes())
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        half.flush()
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    /// Shut down the write direction; later calls are no-ops
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        if let Some(mut half) = state.half.take() {
            let _ = half.shutdown().await;
        }
        state.tx = None;
    }

    pub async fn is_closed(&self) -> bool {
        self.state.lock().await.half.is_none()
    }
}

/// One authenticated connection to the relay
pub struct TransportSession {
    host: String,
    reader: Option<LineReader>,
    writer: Arc<LineWriter>,
}

impl TransportSession {
    /// Open the socket and run the handshake, both under their own timeout
    pub async fn connect(
        credentials: &Credentials,
        config: &SessionConfig,
    ) -> Result<Self, TransportError> {
        let addr = format!("{}:{}", credentials.host, credentials.port);
        info!(%addr, "Connecting to relay server");

        let stream = tokio::time::timeout(
            Duration::from_millis(config.connect_timeout_ms),
            TcpStream::connect(&addr),
        )
        .await
        .map_err(|_| TransportError::Timeout("Connection timeout".into()))?
        .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        let _ = stream.set_nodelay(true);

        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        let client_token = generate_token(&mut rand::thread_rng());
        let auth = HandshakeAuthenticator::new(
            credentials.server_password.as_str(),
            credentials.vehicle_id.as_str(),
        );
        let ciphers = tokio::time::timeout(
            Duration::from_millis(config.handshake_timeout_ms),
            auth.authenticate(&client_token, &mut reader, &mut write_half),
        )
        .await
        .map_err(|_| HandshakeError::Timeout)??;

        debug!(%addr, "Session keys established");
        Ok(Self {
            host: credentials.host.clone(),
            reader: Some(LineReader::new(reader, Some(ciphers.rx))),
            writer: Arc::new(LineWriter::new(write_half, Some(ciphers.tx))),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Handle to the write path for other tasks
    pub fn writer(&self) -> Arc<LineWriter> {
        self.writer.clone()
    }

    pub async fn receive_line(&mut self) -> Result<String, TransportError> {
        match self.reader.as_mut() {
            Some(reader) => reader.receive_line().await,
            None => Err(TransportError::ConnectionClosed),
        }
    }

    pub async fn transmit_line(&self, text: &str) -> Result<(), TransportError> {
        self.writer.transmit_line(text).await
    }

    /// Close the socket and drop both cipher states
    ///
    /// Safe to call more than once. Writer handles held elsewhere start
    /// failing with `ConnectionClosed`.
    pub async fn disconnect(&mut self) {
        self.reader = None;
        self.writer.close().await;
    }
}
