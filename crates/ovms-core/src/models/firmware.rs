//! Vehicle module firmware and modem info (`F` message)

use serde::{Deserialize, Serialize};

use super::{apply_tier, Staleness};
use crate::decode::Params;
use crate::error::DecodeError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FirmwareInfo {
    /// Vehicle module firmware version
    pub version: String,
    pub vin: String,
    /// Raw GSM signal level (0..=31, 99 = unknown)
    pub gsm_signal: i32,
    /// Non-zero when the module may write to the CAN bus
    pub can_write: i32,
    /// Vehicle type code (e.g. "TR", "RT")
    pub car_type: String,
    /// Network operator the modem is locked to
    pub gsm_lock: String,
    pub stale: Staleness,
}

impl FirmwareInfo {
    pub(crate) fn apply(&mut self, p: &Params<'_>) -> Result<(), DecodeError> {
        if p.covers(2) {
            apply_tier(self, |f| {
                f.version = p.text(0);
                f.vin = p.text(1);
                f.gsm_signal = p.i32(2)?;
                f.stale = Staleness::Good;
                Ok(())
            })?;
        }
        if p.covers(4) {
            apply_tier(self, |f| {
                f.can_write = p.i32(3)?;
                f.car_type = p.text(4);
                Ok(())
            })?;
        }
        if p.covers(5) {
            self.gsm_lock = p.text(5);
        }
        Ok(())
    }

    /// Signal strength in dBm, 0 when the level is unknown
    pub fn gsm_dbm(&self) -> i32 {
        if (0..=31).contains(&self.gsm_signal) {
            -113 + 2 * self.gsm_signal
        } else {
            0
        }
    }

    /// Signal strength as 0..=5 bars
    pub fn gsm_bars(&self) -> u8 {
        match self.gsm_dbm() {
            dbm if dbm < -121 || dbm >= 0 => 0,
            dbm if dbm < -107 => 1,
            dbm if dbm < -98 => 2,
            dbm if dbm < -87 => 3,
            dbm if dbm < -76 => 4,
            _ => 5,
        }
    }

    pub fn is_can_write_enabled(&self) -> bool {
        self.can_write != 0
    }
}
