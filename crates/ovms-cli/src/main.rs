//! ovms - Command-line client for OVMS vehicle relays
//!
//! Talks to a vehicle through the relay server: interactive shell,
//! one-shot commands, live event monitoring and status snapshots.

mod commands;
mod config;
mod output;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use ovms_client::Command;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{Config, ConnectionArgs};
use crate::output::{OutputContext, OutputFormat};

#[derive(Parser)]
#[command(name = "ovms")]
#[command(author, version, about = "OVMS vehicle relay client")]
#[command(propagate_version = true)]
struct Cli {
    /// Relay server host
    #[arg(short, long, env = "OVMS_SERVER")]
    server: Option<String>,

    /// Relay server port
    #[arg(short, long, env = "OVMS_PORT")]
    port: Option<u16>,

    /// Vehicle identifier
    #[arg(long = "vehicle", env = "OVMS_VEHICLE_ID")]
    vehicle_id: Option<String>,

    /// Server password
    #[arg(long = "password", env = "OVMS_SERVER_PASSWORD", hide_env_values = true)]
    server_password: Option<String>,

    /// Vehicle module password
    #[arg(long, env = "OVMS_MODULE_PASSWORD", hide_env_values = true)]
    module_password: Option<String>,

    /// Configuration file path
    #[arg(short, long, env = "OVMS_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Seconds to wait for connection and responses
    #[arg(short, long, default_value = "30")]
    wait: u64,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive vehicle shell (`*` USSD, `@` modem, otherwise shell)
    Shell,

    /// Send a single command and print the response
    Command {
        /// Command name (e.g. lock, charge_start) or numeric code
        command: Command,

        /// Command parameters, joined with spaces
        text: Vec<String>,
    },

    /// Print progress events until Ctrl+C
    Monitor,

    /// Print the latest vehicle status
    Status {
        /// Only show keys starting with this prefix (e.g. "status.")
        #[arg(long)]
        filter: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    // Load config file
    let config = if let Some(config_path) = &cli.config {
        Config::load_from(config_path)?
    } else {
        Config::load().unwrap_or_default()
    };

    // Merge CLI args with config
    let merged = config.merge_with_args(&ConnectionArgs {
        server: cli.server.as_deref(),
        port: cli.port,
        vehicle_id: cli.vehicle_id.as_deref(),
        server_password: cli.server_password.as_deref(),
        module_password: cli.module_password.as_deref(),
    })?;

    let format = cli
        .output
        .or_else(|| {
            config
                .output
                .as_deref()
                .and_then(|s| OutputFormat::from_str(s, true).ok())
        })
        .unwrap_or_default();
    let no_color = cli.no_color || config.no_color.unwrap_or(false);
    let ctx = OutputContext::new(format, no_color, cli.quiet);
    let wait = Duration::from_secs(cli.wait);

    // Execute command
    let result = match &cli.command {
        Commands::Shell => commands::shell(merged, wait, &ctx).await,
        Commands::Command { command, text } => {
            commands::command(merged, *command, &text.join(" "), wait, &ctx).await
        }
        Commands::Monitor => commands::monitor(merged, wait, &ctx).await,
        Commands::Status { filter } => {
            commands::status(merged, wait, filter.as_deref(), &ctx).await
        }
    };

    if let Err(e) = &result {
        ctx.error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}
