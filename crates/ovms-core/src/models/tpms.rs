//! Tyre pressure monitoring (`W` message)

use serde::{Deserialize, Serialize};

use super::{apply_tier, Staleness};
use crate::decode::Params;
use crate::error::DecodeError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TyrePressure {
    pub front_right_pressure: f32,
    pub front_right_temp: f32,
    pub rear_right_pressure: f32,
    pub rear_right_temp: f32,
    pub front_left_pressure: f32,
    pub front_left_temp: f32,
    pub rear_left_pressure: f32,
    pub rear_left_temp: f32,
    pub stale: Staleness,
}

impl TyrePressure {
    pub(crate) fn apply(&mut self, p: &Params<'_>) -> Result<(), DecodeError> {
        if p.covers(8) {
            apply_tier(self, |t| {
                t.front_right_pressure = p.f32(0)?;
                t.front_right_temp = p.f32(1)?;
                t.rear_right_pressure = p.f32(2)?;
                t.rear_right_temp = p.f32(3)?;
                t.front_left_pressure = p.f32(4)?;
                t.front_left_temp = p.f32(5)?;
                t.rear_left_pressure = p.f32(6)?;
                t.rear_left_temp = p.f32(7)?;
                t.stale = Staleness::from_raw(p.i32(8)?);
                Ok(())
            })?;
        }
        Ok(())
    }
}
