//! Doors, switches and temperatures (`D` message)

use serde::{Deserialize, Serialize};

use super::{apply_tier, Location, Staleness};
use crate::decode::Params;
use crate::error::DecodeError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub flags1: i32,
    pub flags2: i32,
    pub lock_state: i32,
    pub temp_pem: f32,
    pub temp_motor: i32,
    pub temp_battery: i32,
    pub stale: Staleness,

    /// Seconds since the vehicle was parked
    pub parked_time: i32,
    pub temp_ambient: f32,
    pub flags3: i32,
    pub stale_temps: Staleness,
    pub stale_ambient: Staleness,

    pub battery_12v: f32,
    pub flags4: i32,
    pub battery_12v_ref: f32,
    pub flags5: i32,
    pub temp_charger: f32,
    pub battery_12v_current: f32,
    pub temp_cabin: f32,
}

impl Environment {
    /// Decode a `D` message
    ///
    /// The first tier also carries odometer, trip and speed, which live in
    /// `Location`. Both halves of that tier are committed together.
    pub(crate) fn apply(
        &mut self,
        location: &mut Location,
        p: &Params<'_>,
    ) -> Result<(), DecodeError> {
        if p.covers(8) {
            let mut env = self.clone();
            env.flags1 = p.i32(0)?;
            env.flags2 = p.i32(1)?;
            env.lock_state = p.i32(2)?;
            env.temp_pem = p.f32(3)?;
            env.temp_motor = p.i32(4)?;
            env.temp_battery = p.i32(5)?;
            env.stale = Staleness::Good;
            let trip_meter = p.f32(6)? / 10.0;
            let odometer = p.f32(7)? / 10.0;
            let speed = p.f32(8)?;

            *self = env;
            location.trip_meter = trip_meter;
            location.odometer = odometer;
            location.speed = speed;
        }
        if p.covers(13) {
            apply_tier(self, |e| {
                e.parked_time = p.i32(9)?;
                e.temp_ambient = p.f32(10)?;
                e.flags3 = p.i32(11)?;
                e.stale_temps = Staleness::from_raw(p.i32(12)?);
                e.stale_ambient = Staleness::from_raw(p.i32(13)?);
                Ok(())
            })?;
        }
        if p.covers(15) {
            apply_tier(self, |e| {
                e.battery_12v = p.f32(14)?;
                e.flags4 = p.i32(15)?;
                Ok(())
            })?;
        }
        if p.covers(17) {
            apply_tier(self, |e| {
                e.battery_12v_ref = p.f32(16)?;
                e.flags5 = p.i32(17)?;
                Ok(())
            })?;
        }
        if p.covers(18) {
            self.temp_charger = p.f32(18)?;
        }
        if p.covers(19) {
            self.battery_12v_current = p.f32(19)?;
        }
        if p.covers(20) {
            self.temp_cabin = p.f32(20)?;
        }
        Ok(())
    }

    pub fn front_left_door_open(&self) -> bool {
        self.flags1 & 0x01 != 0
    }

    pub fn front_right_door_open(&self) -> bool {
        self.flags1 & 0x02 != 0
    }

    pub fn charge_port_open(&self) -> bool {
        self.flags1 & 0x04 != 0
    }

    pub fn pilot_present(&self) -> bool {
        self.flags1 & 0x08 != 0
    }

    pub fn charging(&self) -> bool {
        self.flags1 & 0x10 != 0
    }

    pub fn handbrake_on(&self) -> bool {
        self.flags1 & 0x40 != 0
    }

    pub fn car_on(&self) -> bool {
        self.flags1 & 0x80 != 0
    }

    pub fn locked(&self) -> bool {
        self.flags2 & 0x08 != 0
    }

    pub fn valet_mode(&self) -> bool {
        self.flags2 & 0x10 != 0
    }

    pub fn headlights_on(&self) -> bool {
        self.flags2 & 0x20 != 0
    }

    pub fn bonnet_open(&self) -> bool {
        self.flags2 & 0x40 != 0
    }

    pub fn trunk_open(&self) -> bool {
        self.flags2 & 0x80 != 0
    }

    pub fn awake(&self) -> bool {
        self.flags3 & 0x01 != 0
    }

    pub fn alarm_sounding(&self) -> bool {
        self.flags4 & 0x02 != 0
    }

    pub fn rear_left_door_open(&self) -> bool {
        self.flags5 & 0x01 != 0
    }

    pub fn rear_right_door_open(&self) -> bool {
        self.flags5 & 0x02 != 0
    }

    pub fn battery_12v_charging(&self) -> bool {
        self.flags5 & 0x10 != 0
    }

    pub fn aircon_on(&self) -> bool {
        self.flags5 & 0x80 != 0
    }
}
