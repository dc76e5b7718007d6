use serde::{Deserialize, Serialize};

/// Freshness of a group of vehicle values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Staleness {
    /// Never reported
    #[default]
    Unknown,
    /// Reported, but the module no longer considers the value current
    Stale,
    Good,
}

impl Staleness {
    /// Map the raw freshness counter carried in telemetry messages
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            r if r < 0 => Staleness::Unknown,
            0 => Staleness::Stale,
            _ => Staleness::Good,
        }
    }
}
