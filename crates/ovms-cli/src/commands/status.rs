//! Status command - wait for telemetry and print a snapshot

use std::time::Duration;

use anyhow::Result;
use ovms_client::{SessionController, TelemetryRecord};
use ovms_core::Staleness;
use serde_json::Value;

use super::connect;
use crate::config::MergedConfig;
use crate::output::{OutputContext, ValueRow};

pub async fn status(
    config: MergedConfig,
    wait: Duration,
    filter: Option<&str>,
    ctx: &OutputContext,
) -> Result<()> {
    let controller = SessionController::new(config.session);
    connect(&controller, config.credentials, wait).await?;

    // The relay replays the last known status right after login
    let mut snapshots = controller.watch_telemetry();
    let _ = tokio::time::timeout(
        wait,
        snapshots.wait_for(|record| record.status.stale != Staleness::Unknown),
    )
    .await;

    let record = controller.telemetry();
    controller.stop().await;

    if record.status.stale == Staleness::Unknown {
        ctx.warn("No vehicle status received");
    }
    ctx.print(&rows(&record, filter));
    Ok(())
}

fn rows(record: &TelemetryRecord, filter: Option<&str>) -> Vec<ValueRow> {
    let mut values = record.to_key_values();
    for (key, value) in derived(record) {
        values.insert(key.to_string(), value);
    }

    values
        .into_iter()
        .filter(|(key, _)| filter.map_or(true, |f| key.starts_with(f)))
        .map(|(key, value)| ValueRow {
            key,
            value: match value {
                Value::String(s) => s,
                other => other.to_string(),
            },
        })
        .collect()
}

fn derived(record: &TelemetryRecord) -> Vec<(&'static str, Value)> {
    let label = |l: Option<&str>| Value::from(l.unwrap_or(""));
    let env = &record.environment;
    let mut values = vec![
        ("status.charge_state_label", label(record.status.charge_state_label())),
        ("status.charge_substate_label", label(record.status.charge_substate_label())),
        ("status.charge_mode_label", label(record.status.charge_mode_label())),
        ("status.plug_type_label", label(record.status.plug_type_label())),
        (
            "status.distance_unit",
            serde_json::to_value(record.status.distance_unit()).unwrap_or_default(),
        ),
        ("firmware.gsm_dbm", Value::from(record.firmware.gsm_dbm())),
        ("firmware.gsm_bars", Value::from(record.firmware.gsm_bars())),
        ("environment.locked", Value::from(env.locked())),
        ("environment.charging", Value::from(env.charging())),
        ("environment.car_on", Value::from(env.car_on())),
        ("environment.valet_mode", Value::from(env.valet_mode())),
        ("environment.charge_port_open", Value::from(env.charge_port_open())),
        ("environment.alarm_sounding", Value::from(env.alarm_sounding())),
    ];
    if let Some(cfg) = record.twizy_config() {
        values.extend([
            ("status.rt_cfg_type", Value::from(cfg.model)),
            ("status.rt_cfg_profile_user", Value::from(cfg.profile_user)),
            ("status.rt_cfg_profile_cfgmode", Value::from(cfg.profile_cfgmode)),
            ("status.rt_cfg_unsaved", Value::from(cfg.unsaved)),
            ("status.rt_cfg_applied", Value::from(cfg.applied)),
        ]);
    }
    values
}
