//! In-process relay server for integration tests
//!
//! Speaks the server side of the handshake and the encrypted line protocol
//! over a real TCP socket on localhost.

#![allow(dead_code)]

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ovms_client::crypto::{digest_b64, hmac_md5, StreamCipher};
use ovms_client::{Credentials, ProgressEvent, ReconnectConfig, SessionConfig};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

pub const PASSWORD: &str = "relay-secret";
pub const VEHICLE_ID: &str = "TESTCAR";
pub const SERVER_TOKEN: &str = "SERVERtokenSERVERtoken";

const WAIT: Duration = Duration::from_secs(5);

/// Session timing suitable for tests: short timeouts, short backoff, no ping
pub fn test_config() -> SessionConfig {
    SessionConfig {
        ping_interval_secs: 0,
        connect_timeout_ms: 2000,
        handshake_timeout_ms: 2000,
        event_capacity: 64,
        reconnect: ReconnectConfig {
            initial_delay_ms: 10,
            max_delay_ms: 50,
        },
    }
}

pub struct FakeRelay {
    listener: TcpListener,
}

impl FakeRelay {
    pub async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        Self { listener }
    }

    pub fn credentials(&self) -> Credentials {
        let port = self.listener.local_addr().unwrap().port();
        Credentials::new(VEHICLE_ID, PASSWORD, "").with_server("127.0.0.1", port)
    }

    /// Accept one client and complete the handshake
    pub async fn accept(&self) -> RelayConn {
        self.accept_with_digest(None).await.unwrap()
    }

    /// Accept one client and answer its login with a wrong server digest
    pub async fn accept_with_bad_digest(&self) {
        let bad = digest_b64(b"not-the-password", SERVER_TOKEN.as_bytes()).unwrap();
        assert!(self.accept_with_digest(Some(bad)).await.is_none());
    }

    async fn accept_with_digest(&self, digest: Option<String>) -> Option<RelayConn> {
        let (stream, _) = tokio::time::timeout(WAIT, self.listener.accept())
            .await
            .expect("client did not connect")
            .unwrap();
        let (read_half, mut writer) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        let mut request = String::new();
        reader.read_line(&mut request).await.unwrap();
        let fields: Vec<&str> = request.trim_end().split(' ').collect();
        assert_eq!(fields[0], "MP-A");
        assert_eq!(fields[4], VEHICLE_ID);
        let client_token = fields[2].to_string();
        let expected = digest_b64(PASSWORD.as_bytes(), client_token.as_bytes()).unwrap();
        assert_eq!(fields[3], expected);

        let bad_digest = digest.is_some();
        let digest = digest
            .unwrap_or_else(|| digest_b64(PASSWORD.as_bytes(), SERVER_TOKEN.as_bytes()).unwrap());
        writer
            .write_all(format!("MP-S 0 {} {}\r\n", SERVER_TOKEN, digest).as_bytes())
            .await
            .unwrap();
        if bad_digest {
            return None;
        }

        let key = hmac_md5(
            PASSWORD.as_bytes(),
            format!("{}{}", SERVER_TOKEN, client_token).as_bytes(),
        )
        .unwrap();
        Some(RelayConn {
            reader,
            writer,
            rx: StreamCipher::primed(&key).unwrap(),
            tx: StreamCipher::primed(&key).unwrap(),
        })
    }
}

/// Server side of one authenticated connection
pub struct RelayConn {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    rx: StreamCipher,
    tx: StreamCipher,
}

impl RelayConn {
    pub async fn send(&mut self, line: &str) {
        let frame = format!("{}\r\n", BASE64.encode(self.tx.crypt(line.as_bytes())));
        self.writer.write_all(frame.as_bytes()).await.unwrap();
    }

    /// Next decrypted line from the client, `None` on EOF
    pub async fn recv(&mut self) -> Option<String> {
        let mut frame = String::new();
        let n = tokio::time::timeout(WAIT, self.reader.read_line(&mut frame))
            .await
            .expect("timed out waiting for client line")
            .ok()?;
        if n == 0 {
            return None;
        }
        let bytes = BASE64.decode(frame.trim_end()).unwrap();
        Some(String::from_utf8(self.rx.crypt(&bytes)).unwrap())
    }

    /// Encrypt `plaintext` under the paranoid key derived from `token`
    pub fn paranoid_payload(token: &str, plaintext: &str) -> String {
        let key = hmac_md5(PASSWORD.as_bytes(), token.as_bytes()).unwrap();
        let mut cipher = StreamCipher::primed(&key).unwrap();
        BASE64.encode(cipher.crypt(plaintext.as_bytes()))
    }
}

pub async fn next_event(events: &mut broadcast::Receiver<ProgressEvent>) -> ProgressEvent {
    tokio::time::timeout(WAIT, events.recv())
        .await
        .expect("timed out waiting for event")
        .unwrap()
}

/// Skip events until one matches
pub async fn wait_for<F>(events: &mut broadcast::Receiver<ProgressEvent>, mut pred: F) -> ProgressEvent
where
    F: FnMut(&ProgressEvent) -> bool,
{
    loop {
        let event = next_event(events).await;
        if pred(&event) {
            return event;
        }
    }
}
