//! One-shot vehicle command

use std::time::Duration;

use anyhow::{bail, Context, Result};
use ovms_client::{Command, ProgressEvent, SessionController};
use tokio::sync::broadcast;

use super::{connect_ready, parse_response};
use crate::config::MergedConfig;
use crate::output::{OutputContext, ResponseRow};

/// Connect, send one command and print the vehicle's response
pub async fn command(
    config: MergedConfig,
    command: Command,
    text: &str,
    wait: Duration,
    ctx: &OutputContext,
) -> Result<()> {
    let controller = SessionController::new(config.session);
    let mut events = connect_ready(&controller, config.credentials, wait, ctx).await?;

    let result = send_and_wait(&controller, &mut events, command, text, wait, ctx).await;
    controller.stop().await;
    result
}

async fn send_and_wait(
    controller: &SessionController,
    events: &mut broadcast::Receiver<ProgressEvent>,
    command: Command,
    text: &str,
    wait: Duration,
    ctx: &OutputContext,
) -> Result<()> {
    controller
        .transmit_command(command, text)
        .await
        .with_context(|| format!("Failed to send {}", command))?;
    ctx.info(&format!("Sent {} ({})", command, command.code()));

    let deadline = tokio::time::Instant::now() + wait;
    loop {
        let event = match tokio::time::timeout_at(deadline, events.recv()).await {
            Ok(Ok(event)) => event,
            Ok(Err(broadcast::error::RecvError::Lagged(_))) => continue,
            Ok(Err(_)) => bail!("Session closed"),
            Err(_) => bail!("No response from vehicle within {:?}", wait),
        };

        match event {
            ProgressEvent::Command(text) => {
                let Some(response) = parse_response(&text) else {
                    continue;
                };
                if response.command != command.code() {
                    continue;
                }
                ctx.print(&[ResponseRow {
                    command: command.to_string(),
                    result: response.result.to_string(),
                    output: response.text(),
                }]);
                if !response.is_ok() {
                    bail!("Vehicle reported {}", response.result);
                }
                return Ok(());
            }
            ProgressEvent::Error(e) => ctx.warn(&e),
            _ => {}
        }
    }
}
