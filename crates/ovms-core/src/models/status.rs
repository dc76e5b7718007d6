//! Battery and charging status (`S` message)

use serde::{Deserialize, Serialize};

use super::{apply_tier, Staleness};
use crate::decode::Params;
use crate::error::DecodeError;

/// Distance unit reported by the vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceUnit {
    Kilometers,
    Miles,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChargeStatus {
    /// State of charge in percent
    pub soc: f32,
    /// Raw distance unit, `M` for miles, `K` for kilometers
    pub units: String,
    pub charge_voltage: f32,
    pub charge_current: f32,
    pub charge_state: String,
    pub charge_mode: String,
    pub range_ideal: f32,
    pub range_estimated: f32,
    pub stale: Staleness,

    pub charge_current_limit: f32,
    /// Minutes since the charge started
    pub charge_duration: i32,
    pub charge_b4: i32,
    /// Energy consumed by this charge, in 1/10 kWh
    pub charge_kwh_consumed: i32,
    pub charge_substate_code: i32,
    pub charge_state_code: i32,
    pub charge_mode_code: i32,

    pub charge_timer_mode: i32,
    pub charge_timer_start: i32,
    pub stale_charge_timer: Staleness,

    /// Calculated amp-hour capacity
    pub cac: f32,

    pub charge_full_mins: i32,
    pub charge_limit_mins: i32,
    pub charge_limit_range: f32,
    pub charge_limit_soc: i32,
    pub cooldown_cooling: i32,
    pub cooldown_battery_temp: i32,
    pub cooldown_time_limit: i32,
    pub charge_estimate: i32,

    pub charge_limit_mins_range: i32,
    pub charge_limit_mins_soc: i32,
    pub range_full: f32,

    pub plug_type_code: i32,
    pub power_kw: f32,
    pub battery_voltage: f32,

    /// State of health in percent
    pub soh: f32,
}

impl ChargeStatus {
    pub(crate) fn apply(&mut self, p: &Params<'_>) -> Result<(), DecodeError> {
        if p.covers(7) {
            apply_tier(self, |s| {
                s.soc = p.f32(0)?;
                s.units = p.text(1);
                s.charge_voltage = p.f32(2)?;
                s.charge_current = p.f32(3)?;
                s.charge_state = p.text(4);
                s.charge_mode = p.text(5);
                s.range_ideal = p.f32(6)?;
                s.range_estimated = p.f32(7)?;
                s.stale = Staleness::Good;
                Ok(())
            })?;
        }
        if p.covers(14) {
            apply_tier(self, |s| {
                s.charge_current_limit = p.f32(8)?;
                s.charge_duration = p.i32(9)?;
                s.charge_b4 = p.i32(10)?;
                s.charge_kwh_consumed = p.i32(11)?;
                s.charge_substate_code = p.i32(12)?;
                s.charge_state_code = p.i32(13)?;
                s.charge_mode_code = p.i32(14)?;
                Ok(())
            })?;
        }
        if p.covers(17) {
            apply_tier(self, |s| {
                s.charge_timer_mode = p.i32(15)?;
                s.charge_timer_start = p.i32(16)?;
                s.stale_charge_timer = Staleness::from_raw(p.i32(17)?);
                Ok(())
            })?;
        }
        if p.covers(18) {
            self.cac = p.f32(18)?;
        }
        if p.covers(26) {
            apply_tier(self, |s| {
                s.charge_full_mins = p.i32(19)?;
                s.charge_limit_mins = p.i32(20)?;
                s.charge_limit_range = p.f32(21)?;
                s.charge_limit_soc = p.i32(22)?;
                s.cooldown_cooling = p.i32(23)?;
                s.cooldown_battery_temp = p.i32(24)?;
                s.cooldown_time_limit = p.i32(25)?;
                s.charge_estimate = p.i32(26)?;
                Ok(())
            })?;
        }
        if p.covers(29) {
            apply_tier(self, |s| {
                s.charge_limit_mins_range = p.i32(27)?;
                s.charge_limit_mins_soc = p.i32(28)?;
                s.range_full = p.f32(29)?;
                Ok(())
            })?;
        }
        if p.covers(32) {
            apply_tier(self, |s| {
                s.plug_type_code = p.i32(30)?;
                s.power_kw = p.f32(31)?;
                s.battery_voltage = p.f32(32)?;
                Ok(())
            })?;
        }
        if p.covers(33) {
            self.soh = p.f32(33)?;
        }
        Ok(())
    }

    pub fn distance_unit(&self) -> DistanceUnit {
        if self.units.starts_with('M') {
            DistanceUnit::Miles
        } else {
            DistanceUnit::Kilometers
        }
    }

    pub fn charge_state_label(&self) -> Option<&'static str> {
        match self.charge_state_code {
            1 => Some("Charging"),
            2 => Some("Top off"),
            4 => Some("Done"),
            13 => Some("Prepare"),
            14 => Some("Timer wait"),
            15 => Some("Heating"),
            21 => Some("Stopped"),
            _ => None,
        }
    }

    pub fn charge_substate_label(&self) -> Option<&'static str> {
        match self.charge_substate_code {
            0x01 => Some("Scheduled stop"),
            0x02 => Some("Scheduled start"),
            0x03 => Some("On request"),
            0x05 => Some("Timer wait"),
            0x07 => Some("Power wait"),
            0x0d => Some("Stopped"),
            0x0e => Some("Interrupted"),
            _ => None,
        }
    }

    pub fn charge_mode_label(&self) -> Option<&'static str> {
        match self.charge_mode_code {
            0 => Some("Standard"),
            1 => Some("Storage"),
            3 => Some("Range"),
            4 => Some("Performance"),
            _ => None,
        }
    }

    pub fn plug_type_label(&self) -> Option<&'static str> {
        match self.plug_type_code {
            1 => Some("Type 1"),
            2 => Some("Type 2"),
            3 => Some("ChaDeMo"),
            4 => Some("Roadster"),
            5 => Some("Tesla-US"),
            6 => Some("SuperCharger"),
            7 => Some("CCS"),
            _ => None,
        }
    }
}
