//! Relay-server metadata (`f`, `Z`, `T` messages)

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::decode::Params;
use crate::error::DecodeError;

/// Connection metadata reported by the relay server
///
/// Unlike vehicle state this is tied to one connection and is reset at the
/// start of every attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Relay server firmware string (kept across resets)
    pub firmware: String,
    /// Number of vehicle modules currently connected to the relay
    pub cars_connected: i32,
    /// When the vehicle last reported to the relay
    pub last_updated: DateTime<Utc>,
    /// Whether the server switched this session to paranoid mode
    pub paranoid: bool,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            firmware: String::new(),
            cars_connected: 0,
            last_updated: Utc::now(),
            paranoid: false,
        }
    }
}

impl ServerInfo {
    /// Clear the per-connection fields
    pub fn reset(&mut self) {
        self.cars_connected = 0;
        self.last_updated = Utc::now();
        self.paranoid = false;
    }

    pub(crate) fn apply_firmware(&mut self, p: &Params<'_>) -> Result<(), DecodeError> {
        if p.covers(0) {
            self.firmware = p.text(0);
        }
        Ok(())
    }

    pub(crate) fn apply_cars_connected(&mut self, p: &Params<'_>) -> Result<(), DecodeError> {
        if p.covers(0) {
            self.cars_connected = p.i32(0)?;
        }
        Ok(())
    }

    pub(crate) fn apply_last_update(&mut self, p: &Params<'_>) -> Result<(), DecodeError> {
        if p.covers(0) {
            let secs: i64 = p.parse(0)?;
            let out_of_range = || DecodeError::TimestampOutOfRange { code: 'T', value: secs };
            let age = TimeDelta::try_seconds(secs).ok_or_else(out_of_range)?;
            self.last_updated = Utc::now()
                .checked_sub_signed(age)
                .ok_or_else(out_of_range)?;
        }
        Ok(())
    }
}
