//! TCP transport with CRLF line framing
//!
//! After the handshake every line is `base64(rc4(text))`. Each direction
//! has its own cipher whose state advances with every line, so lines must
//! be encrypted in exactly the order they hit the wire.

mod error;
mod session;

pub use error::TransportError;
pub use session::{LineReader, LineWriter, TransportSession, MAX_LINE_BYTES};
