//! Command implementations for the ovms CLI

pub mod command;
pub mod monitor;
pub mod shell;
pub mod status;

pub use command::command;
pub use monitor::monitor;
pub use shell::shell;
pub use status::status;

use std::time::Duration;

use anyhow::{bail, Result};
use ovms_client::{CommandResponse, Credentials, Message, ProgressEvent, SessionController};
use tokio::sync::broadcast;
use tracing::debug;

use crate::output::OutputContext;

/// Start the session and wait until it is connected
///
/// Failed attempts are retried by the controller; this only gives up when
/// `timeout` expires, reporting the last error seen.
pub async fn connect(
    controller: &SessionController,
    credentials: Credentials,
    timeout: Duration,
) -> Result<broadcast::Receiver<ProgressEvent>> {
    let mut events = controller.subscribe();
    debug!(host = %credentials.host, vehicle = %credentials.vehicle_id, "Starting session");
    controller.start(credentials).await;

    let mut last_error = None;
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        match tokio::time::timeout_at(deadline, events.recv()).await {
            Ok(Ok(ProgressEvent::ConnectComplete(_))) => return Ok(events),
            Ok(Ok(ProgressEvent::Error(e))) => {
                debug!(error = %e, "Connection attempt failed");
                last_error = Some(e);
            }
            Ok(Ok(_)) | Ok(Err(broadcast::error::RecvError::Lagged(_))) => {}
            Ok(Err(broadcast::error::RecvError::Closed)) => bail!("Session closed"),
            Err(_) => {
                controller.stop().await;
                match last_error {
                    Some(e) => bail!("Could not connect: {}", e),
                    None => bail!("Timed out connecting to relay server"),
                }
            }
        }
    }
}

/// Wait until the vehicle's capability table has arrived
pub async fn wait_for_capabilities(
    controller: &SessionController,
    events: &mut broadcast::Receiver<ProgressEvent>,
    timeout: Duration,
) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while controller.telemetry().capabilities.count() == 0 {
        match tokio::time::timeout_at(deadline, events.recv()).await {
            Ok(Ok(_)) | Ok(Err(broadcast::error::RecvError::Lagged(_))) => {}
            _ => return false,
        }
    }
    true
}

/// Connect and hold off until the vehicle has announced its commands
///
/// Commands sent before the capability table arrives are refused locally,
/// so callers that send right away go through here.
pub async fn connect_ready(
    controller: &SessionController,
    credentials: Credentials,
    timeout: Duration,
    ctx: &OutputContext,
) -> Result<broadcast::Receiver<ProgressEvent>> {
    let mut events = connect(controller, credentials, timeout).await?;
    if !wait_for_capabilities(controller, &mut events, timeout).await {
        ctx.warn("Vehicle capabilities not received, commands may be refused");
    }
    Ok(events)
}

/// Rebuild a command response from the text of a `Command` event
pub fn parse_response(text: &str) -> Option<CommandResponse> {
    let msg = Message::parse_payload(&format!("c{}", text))?;
    CommandResponse::from_message(&msg)
}
