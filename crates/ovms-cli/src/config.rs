//! Configuration file handling for the ovms CLI

use anyhow::{Context, Result};
use ovms_client::config::{DEFAULT_HOST, DEFAULT_PORT};
use ovms_client::{Credentials, SessionConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration for the CLI tool
///
/// Every field can also be given on the command line or through an
/// `OVMS_*` environment variable; those win over the file.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Relay server host
    pub server: Option<String>,
    /// Relay server port
    pub port: Option<u16>,
    /// Vehicle identifier
    pub vehicle_id: Option<String>,
    /// Server password shared with the relay
    pub server_password: Option<String>,
    /// Vehicle module password
    pub module_password: Option<String>,
    /// Default output format
    pub output: Option<String>,
    /// Disable colored output
    pub no_color: Option<bool>,
    /// Session timing overrides
    #[serde(default)]
    pub session: SessionConfig,
}

/// Connection options collected from flags and environment
#[derive(Default)]
pub struct ConnectionArgs<'a> {
    pub server: Option<&'a str>,
    pub port: Option<u16>,
    pub vehicle_id: Option<&'a str>,
    pub server_password: Option<&'a str>,
    pub module_password: Option<&'a str>,
}

impl Config {
    /// Load configuration from the default config file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading config");
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("ovms-cli");

        Ok(config_dir.join("config.toml"))
    }

    /// Merge CLI arguments over config file values
    pub fn merge_with_args(&self, args: &ConnectionArgs<'_>) -> Result<MergedConfig> {
        let pick = |arg: Option<&str>, file: &Option<String>| {
            arg.map(String::from).or_else(|| file.clone())
        };

        let vehicle_id = pick(args.vehicle_id, &self.vehicle_id)
            .context("No vehicle id given (use --vehicle, OVMS_VEHICLE_ID or the config file)")?;
        let server_password = pick(args.server_password, &self.server_password).context(
            "No server password given (use --password, OVMS_SERVER_PASSWORD or the config file)",
        )?;
        let module_password = pick(args.module_password, &self.module_password).unwrap_or_default();

        let credentials = Credentials::new(vehicle_id, server_password, module_password)
            .with_server(
                pick(args.server, &self.server).unwrap_or_else(|| DEFAULT_HOST.to_string()),
                args.port.or(self.port).unwrap_or(DEFAULT_PORT),
            );

        Ok(MergedConfig {
            credentials,
            session: self.session.clone(),
        })
    }
}

/// Fully resolved configuration after merging CLI args
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub credentials: Credentials,
    pub session: SessionConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_args_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            server = "relay.example"
            vehicle_id = "FILECAR"
            server_password = "file-pw"

            [session]
            ping_interval_secs = 120
            "#
        )
        .unwrap();
        let config = Config::load_from(file.path()).unwrap();

        let merged = config
            .merge_with_args(&ConnectionArgs {
                vehicle_id: Some("ARGCAR"),
                port: Some(7000),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(merged.credentials.host, "relay.example");
        assert_eq!(merged.credentials.port, 7000);
        assert_eq!(merged.credentials.vehicle_id, "ARGCAR");
        assert_eq!(merged.credentials.server_password, "file-pw");
        assert_eq!(merged.session.ping_interval_secs, 120);
    }

    #[test]
    fn test_defaults_and_missing_credentials() {
        let config = Config::default();
        assert!(config.merge_with_args(&ConnectionArgs::default()).is_err());

        let merged = config
            .merge_with_args(&ConnectionArgs {
                vehicle_id: Some("DEMO"),
                server_password: Some("pw"),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(merged.credentials.host, "tmc.openvehicles.com");
        assert_eq!(merged.credentials.port, 6867);
        assert_eq!(merged.credentials.module_password, "");
    }
}
