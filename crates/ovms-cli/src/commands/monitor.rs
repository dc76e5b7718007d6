//! Monitor command - print progress events until Ctrl+C

use std::time::Duration;

use anyhow::Result;
use ovms_client::SessionController;
use tokio::sync::broadcast::error::RecvError;

use super::connect;
use crate::config::MergedConfig;
use crate::output::OutputContext;

pub async fn monitor(config: MergedConfig, wait: Duration, ctx: &OutputContext) -> Result<()> {
    let controller = SessionController::new(config.session);
    ctx.info(&format!(
        "Monitoring {} via {}:{}",
        config.credentials.vehicle_id, config.credentials.host, config.credentials.port
    ));
    let mut events = connect(&controller, config.credentials, wait).await?;
    ctx.info("Press Ctrl+C to stop");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => ctx.print_event(&event),
                Err(RecvError::Lagged(n)) => ctx.warn(&format!("Skipped {} events", n)),
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    ctx.info("\nStopping session...");
    controller.stop().await;
    ctx.success("Session stopped");
    Ok(())
}
