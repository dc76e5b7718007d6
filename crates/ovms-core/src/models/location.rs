//! Position and drive data (`L` message, odometer from `D`)

use serde::{Deserialize, Serialize};

use super::{apply_tier, Staleness};
use crate::decode::Params;
use crate::error::DecodeError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// Heading in degrees
    pub direction: f64,
    pub altitude: f64,
    pub gps_lock: i32,
    pub stale: Staleness,
    pub gps_speed: f32,
    pub trip_meter: f32,
    pub odometer: f32,
    pub speed: f32,
    pub drive_mode: i32,
    pub drive_power: f32,
    pub energy_used: f32,
    pub energy_recovered: f32,
}

impl Location {
    pub(crate) fn apply(&mut self, p: &Params<'_>) -> Result<(), DecodeError> {
        if p.covers(1) {
            apply_tier(self, |l| {
                l.latitude = p.f64(0)?;
                l.longitude = p.f64(1)?;
                Ok(())
            })?;
        }
        if p.covers(5) {
            apply_tier(self, |l| {
                l.direction = p.f64(2)?;
                l.altitude = p.f64(3)?;
                l.gps_lock = p.i32(4)?;
                l.stale = Staleness::from_raw(p.i32(5)?);
                Ok(())
            })?;
        }
        if p.covers(7) {
            apply_tier(self, |l| {
                l.gps_speed = p.f32(6)?;
                l.trip_meter = p.f32(7)?;
                Ok(())
            })?;
        }
        if p.covers(11) {
            apply_tier(self, |l| {
                l.drive_mode = p.i32(8)?;
                l.drive_power = p.f32(9)?;
                l.energy_used = p.f32(10)?;
                l.energy_recovered = p.f32(11)?;
                Ok(())
            })?;
        }
        Ok(())
    }

    pub fn has_gps_lock(&self) -> bool {
        self.gps_lock > 0
    }
}

/// Renault Twizy tuning state packed into the drive mode field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwizyConfig {
    /// 0 = Twizy80, 1 = Twizy45
    pub model: u8,
    /// User selected profile, 0 = default, 1..=3 custom
    pub profile_user: u8,
    /// Profile the cfgmode parameters were last loaded from
    pub profile_cfgmode: u8,
    /// Profile changed in RAM but not saved
    pub unsaved: bool,
    /// Last profile apply succeeded
    pub applied: bool,
}

impl TwizyConfig {
    pub fn from_drive_mode(drive_mode: i32) -> Self {
        Self {
            model: (drive_mode & 0x01) as u8,
            profile_user: ((drive_mode & 0x06) >> 1) as u8,
            profile_cfgmode: ((drive_mode & 0x18) >> 3) as u8,
            unsaved: drive_mode & 0x20 != 0,
            applied: drive_mode & 0x80 != 0,
        }
    }
}
