//! Output formatting for the ovms CLI (table, json)

use clap::ValueEnum;
use colored::Colorize;
use ovms_client::ProgressEvent;
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Context for output rendering
pub struct OutputContext {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat, no_color: bool, quiet: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format, quiet }
    }

    /// Print a success message (unless in quiet mode)
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg.green());
        }
    }

    /// Print an info message (unless in quiet mode)
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg);
        }
    }

    pub fn warn(&self, msg: &str) {
        eprintln!("{}", msg.yellow());
    }

    pub fn error(&self, msg: &str) {
        eprintln!("{}", msg.red());
    }

    /// Print rows in the configured format
    pub fn print<T: Tabled + Serialize>(&self, data: &[T]) {
        match self.format {
            OutputFormat::Table => {
                if data.is_empty() {
                    if !self.quiet {
                        println!("No data");
                    }
                } else {
                    println!("{}", Table::new(data));
                }
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(data).unwrap_or_else(|_| "[]".to_string())
                );
            }
        }
    }

    /// Print one progress event as it arrives
    pub fn print_event(&self, event: &ProgressEvent) {
        match self.format {
            OutputFormat::Json => {
                if let Ok(line) = serde_json::to_string(event) {
                    println!("{}", line);
                }
            }
            OutputFormat::Table => match event {
                ProgressEvent::ConnectBegin(_) | ProgressEvent::Disconnect(_) => {
                    println!("{}", event.to_string().yellow())
                }
                ProgressEvent::ConnectComplete(_) => println!("{}", event.to_string().green()),
                ProgressEvent::Error(_) => println!("{}", event.to_string().red()),
                ProgressEvent::Push(text) => println!("{} {}", "push".bold(), text),
                _ => println!("{}", event),
            },
        }
    }
}

/// Key/value display for the status command
#[derive(Debug, Tabled, Serialize)]
pub struct ValueRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

/// Command response display
#[derive(Debug, Tabled, Serialize)]
pub struct ResponseRow {
    #[tabled(rename = "Command")]
    pub command: String,
    #[tabled(rename = "Result")]
    pub result: String,
    #[tabled(rename = "Output")]
    pub output: String,
}
