//! Connection lifecycle: connect, receive, keep-alive, reconnect

mod controller;
mod events;

pub use controller::SessionController;
pub use events::ProgressEvent;

use serde::Serialize;

/// Session controller state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No session loop running
    #[default]
    Idle,
    /// Loop running, connecting or waiting to retry
    Connecting,
    /// Authenticated and receiving
    Connected,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionState::Idle => "idle",
            SessionState::Connecting => "connecting",
            SessionState::Connected => "connected",
        };
        f.write_str(s)
    }
}
