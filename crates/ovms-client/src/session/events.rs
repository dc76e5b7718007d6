use ovms_core::Message;
use serde::Serialize;

/// Notifications published by the session loop, in wire order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ProgressEvent {
    ConnectBegin(String),
    ConnectComplete(String),
    Disconnect(String),
    /// A message was decoded and applied to the telemetry record
    Update(Message),
    /// Command response, parameters rejoined with commas
    Command(String),
    /// Push notification text
    Push(String),
    Error(String),
}

impl ProgressEvent {
    /// Event for a successfully decoded inbound message
    pub(crate) fn for_message(msg: &Message) -> Self {
        match msg.code {
            'c' => ProgressEvent::Command(msg.joined_params()),
            'P' => ProgressEvent::Push(msg.joined_params()),
            _ => ProgressEvent::Update(msg.clone()),
        }
    }
}

impl std::fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgressEvent::ConnectBegin(host) => write!(f, "connecting to {}", host),
            ProgressEvent::ConnectComplete(host) => write!(f, "connected to {}", host),
            ProgressEvent::Disconnect(host) => write!(f, "disconnected from {}", host),
            ProgressEvent::Update(msg) => write!(f, "update {}", msg),
            ProgressEvent::Command(text) => write!(f, "command {}", text),
            ProgressEvent::Push(text) => write!(f, "push {}", text),
            ProgressEvent::Error(text) => write!(f, "error {}", text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_mapping() {
        let cmd = Message::new('c', vec!["7".into(), "0".into(), "ok".into()]);
        assert_eq!(ProgressEvent::for_message(&cmd), ProgressEvent::Command("7,0,ok".into()));

        let push = Message::new('P', vec!["ATrip".into(), "done".into()]);
        assert_eq!(ProgressEvent::for_message(&push), ProgressEvent::Push("ATrip,done".into()));

        let status = Message::new('S', vec!["80".into()]);
        assert_eq!(ProgressEvent::for_message(&status), ProgressEvent::Update(status.clone()));
    }
}
