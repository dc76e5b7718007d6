//! ovms-client - Async client for the OVMS vehicle relay
//!
//! Connects to a relay server, authenticates with the shared server
//! password, and keeps an encrypted session alive while decoding inbound
//! telemetry into an [`ovms_core::TelemetryRecord`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   SessionController                      │
//! │  start / stop / transmit_command                         │
//! │                                                          │
//! │  ┌───────────────┐   ┌──────────────┐   ┌─────────────┐  │
//! │  │ ping task     │   │ session loop │──▶│ events      │  │
//! │  │ (interval)    │   │ (reconnect)  │   │ (broadcast) │  │
//! │  └──────┬────────┘   └──────┬───────┘   │ telemetry   │  │
//! │         │                   │           │ (watch)     │  │
//! │         │            ┌──────┴───────┐   └─────────────┘  │
//! │         │            │ProtocolCodec │                    │
//! │         │            │(paranoid E)  │                    │
//! │         │            └──────┬───────┘                    │
//! │  ┌──────┴───────────────────┴────────┐                   │
//! │  │         TransportSession          │                   │
//! │  │ LineWriter (shared) │ LineReader  │                   │
//! │  │   base64(rc4(line)) + CRLF        │                   │
//! │  └─────────────────┬─────────────────┘                   │
//! │            HandshakeAuthenticator                        │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use ovms_client::{Credentials, ProgressEvent, SessionConfig, SessionController};
//!
//! # async fn run() {
//! let controller = SessionController::new(SessionConfig::default());
//! let mut events = controller.subscribe();
//! controller.start(Credentials::new("DEMO", "server-password", "")).await;
//!
//! while let Ok(event) = events.recv().await {
//!     if let ProgressEvent::Update(msg) = event {
//!         println!("{}", msg);
//!     }
//! }
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod crypto;
pub mod error;
pub mod handshake;
pub mod session;
pub mod transport;

pub use codec::{CodecError, ProtocolCodec};
pub use config::{
    ClientConfig, ConfigError, Credentials, ReconnectConfig, ServerConfig, SessionConfig,
    VehicleConfig,
};
pub use crypto::{CipherError, StreamCipher};
pub use error::SessionError;
pub use handshake::{HandshakeAuthenticator, HandshakeError, SessionCiphers};
pub use session::{ProgressEvent, SessionController, SessionState};
pub use transport::{TransportError, TransportSession};

pub use ovms_core::{Command, CommandResponse, CommandResult, Message, TelemetryRecord};
