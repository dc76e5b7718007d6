//! Protocol message representation

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single protocol message: one code character and its parameters
///
/// Used for inbound telemetry, outbound commands, and the plaintext of
/// paranoid-mode payloads once they have been unwrapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub code: char,
    pub params: Vec<String>,
}

impl Message {
    pub fn new(code: char, params: Vec<String>) -> Self {
        Self { code, params }
    }

    /// Message with no parameters (e.g. the `A` ping)
    pub fn bare(code: char) -> Self {
        Self {
            code,
            params: Vec::new(),
        }
    }

    /// Parse the `{code}{csv-params}` part of a line
    ///
    /// An empty parameter section yields no parameters rather than a single
    /// empty one. Returns `None` for an empty payload.
    pub fn parse_payload(payload: &str) -> Option<Self> {
        let mut chars = payload.chars();
        let code = chars.next()?;
        let rest = chars.as_str();
        let params = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split(',').map(str::to_string).collect()
        };
        Some(Self { code, params })
    }

    /// Build an outbound vehicle command (`C` message)
    ///
    /// The command text is appended verbatim as the last parameter. Commas
    /// in it are not escaped: the vehicle treats everything after the code
    /// as the command argument.
    pub fn command(code: u8, text: &str) -> Self {
        let mut params = vec![code.to_string()];
        if !text.is_empty() {
            params.push(text.to_string());
        }
        Self {
            code: 'C',
            params,
        }
    }

    /// Parameters joined back into their wire form
    pub fn joined_params(&self) -> String {
        self.params.join(",")
    }

    /// The `{code}{csv-params}` wire payload
    pub fn payload(&self) -> String {
        format!("{}{}", self.code, self.joined_params())
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.code, self.joined_params())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_payload_with_params() {
        let msg = Message::parse_payload("S85.5,K,230,16").unwrap();
        assert_eq!(msg.code, 'S');
        assert_eq!(msg.params, vec!["85.5", "K", "230", "16"]);
    }

    #[test]
    fn test_parse_payload_without_params() {
        let msg = Message::parse_payload("a").unwrap();
        assert_eq!(msg.code, 'a');
        assert!(msg.params.is_empty());
        assert!(Message::parse_payload("").is_none());
    }

    #[test]
    fn test_parse_payload_keeps_empty_fields() {
        let msg = Message::parse_payload("F1.2.3,,5").unwrap();
        assert_eq!(msg.params, vec!["1.2.3", "", "5"]);
    }

    #[test]
    fn test_command_payload() {
        assert_eq!(Message::command(11, "").payload(), "C11");
        assert_eq!(Message::command(7, "stat").payload(), "C7,stat");
        // Free text is passed through unescaped
        assert_eq!(Message::command(7, "echo a,b").payload(), "C7,echo a,b");
    }
}
