//! Interactive shell
//!
//! Each input line is sent to the vehicle:
//! - `*...` as an MMI/USSD code (e.g. `*100#`)
//! - `@...` as a modem command, without the `@`
//! - anything else as a module shell command

use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use ovms_client::{Command, CommandResult, ProgressEvent, SessionController};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use super::{connect_ready, parse_response};
use crate::config::MergedConfig;
use crate::output::OutputContext;

/// Map one input line to the command that carries it
pub fn route_input(line: &str) -> (Command, &str) {
    if line.starts_with('*') {
        (Command::MmiUssd, line)
    } else if let Some(rest) = line.strip_prefix('@') {
        (Command::Modem, rest)
    } else {
        (Command::Shell, line)
    }
}

pub async fn shell(config: MergedConfig, wait: Duration, ctx: &OutputContext) -> Result<()> {
    let controller = SessionController::new(config.session);
    let vehicle = config.credentials.vehicle_id.clone();
    let mut events = connect_ready(&controller, config.credentials, wait, ctx).await?;
    ctx.success(&format!("Connected to {}. Type 'exit' to quit.", vehicle));

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = input.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "exit" || line == "quit" {
                    break;
                }
                let (command, text) = route_input(line);
                if let Err(e) = controller.transmit_command(command, text).await {
                    ctx.error(&e.to_string());
                }
            }
            event = events.recv() => match event {
                Ok(event) => print_event(&event, ctx),
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    controller.stop().await;
    Ok(())
}

fn print_event(event: &ProgressEvent, ctx: &OutputContext) {
    match event {
        ProgressEvent::Command(text) => match parse_response(text) {
            Some(response) => match response.result {
                CommandResult::Ok => {
                    for line in &response.lines {
                        println!("{}", line);
                    }
                }
                CommandResult::Failed => ctx.error(&format!("Failed: {}", response.text())),
                CommandResult::Unsupported => ctx.warn("Unsupported"),
                CommandResult::Unimplemented => ctx.warn("Unimplemented"),
                CommandResult::Other(n) => ctx.warn(&format!("Result {}", n)),
            },
            None => ctx.warn(&format!("Malformed response: {}", text)),
        },
        ProgressEvent::Push(text) => println!("{} {}", "push".bold(), text),
        ProgressEvent::Error(text) => ctx.error(text),
        ProgressEvent::Disconnect(_) | ProgressEvent::ConnectComplete(_) => ctx.print_event(event),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_input() {
        assert_eq!(route_input("*100#"), (Command::MmiUssd, "*100#"));
        assert_eq!(route_input("@AT+CSQ"), (Command::Modem, "AT+CSQ"));
        assert_eq!(route_input("stat"), (Command::Shell, "stat"));
    }
}
