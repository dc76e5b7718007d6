//! Decoded vehicle state

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::decode::Params;
use crate::error::DecodeError;
use crate::message::Message;
use crate::models::{
    ChargeStatus, CommandSupport, Environment, FirmwareInfo, Location, ServerInfo, TwizyConfig,
    TyrePressure,
};

/// Everything known about the vehicle and the relay connection
///
/// One record lives for the lifetime of a session controller. Vehicle state
/// persists across reconnects; only `server` is reset per connection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub server: ServerInfo,
    pub firmware: FirmwareInfo,
    pub capabilities: CommandSupport,
    pub status: ChargeStatus,
    pub location: Location,
    pub environment: Environment,
    pub tpms: TyrePressure,
}

impl TelemetryRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one inbound message
    ///
    /// Codes without a decoder (ping ack, command responses, push
    /// notifications, anything unknown) leave the record unchanged.
    pub fn apply(&mut self, msg: &Message) -> Result<(), DecodeError> {
        let p = Params::new(msg);
        trace!(code = %msg.code, params = msg.params.len(), "Applying message");
        match msg.code {
            'f' => self.server.apply_firmware(&p),
            'Z' => self.server.apply_cars_connected(&p),
            'T' => self.server.apply_last_update(&p),
            'F' => self.firmware.apply(&p),
            'V' => {
                self.capabilities.apply(&p)?;
                debug!(supported = ?self.capabilities.supported(), "Capabilities updated");
                Ok(())
            }
            'S' => self.status.apply(&p),
            'L' => self.location.apply(&p),
            'D' => self.environment.apply(&mut self.location, &p),
            'W' => self.tpms.apply(&p),
            _ => Ok(()),
        }
    }

    /// Clear server-origin fields at the start of a connection attempt
    pub fn reset_server(&mut self) {
        self.server.reset();
    }

    pub fn supports(&self, code: u8) -> bool {
        self.capabilities.supports(code)
    }

    /// Twizy tuning state, only reported by `RT` vehicles
    pub fn twizy_config(&self) -> Option<TwizyConfig> {
        (self.firmware.car_type == "RT")
            .then(|| TwizyConfig::from_drive_mode(self.location.drive_mode))
    }

    /// Flatten the record into `group.field` keys
    pub fn to_key_values(&self) -> BTreeMap<String, Value> {
        let mut out = BTreeMap::new();
        if let Ok(value) = serde_json::to_value(self) {
            flatten(String::new(), value, &mut out);
        }
        out
    }

    /// Look up one value by its dotted key (e.g. `status.soc`)
    pub fn get(&self, key: &str) -> Option<Value> {
        let value = serde_json::to_value(self).ok()?;
        key.split('.')
            .try_fold(&value, |v, part| v.get(part))
            .cloned()
    }
}

fn flatten(prefix: String, value: Value, out: &mut BTreeMap<String, Value>) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                let key = if prefix.is_empty() {
                    key
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(key, inner, out);
            }
        }
        other => {
            out.insert(prefix, other);
        }
    }
}
