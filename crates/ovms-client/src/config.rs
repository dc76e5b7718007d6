//! Client configuration
//!
//! Loaded from TOML; every field except the vehicle credentials has a
//! default so a minimal file only needs the `[vehicle]` table.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default relay server
pub const DEFAULT_HOST: &str = "tmc.openvehicles.com";
pub const DEFAULT_PORT: u16 = 6867;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub vehicle: VehicleConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl ClientConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            host: self.server.host.clone(),
            port: self.server.port,
            vehicle_id: self.vehicle.id.clone(),
            server_password: self.vehicle.server_password.clone(),
            module_password: self.vehicle.module_password.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct VehicleConfig {
    /// Vehicle identifier registered with the relay
    pub id: String,
    /// Shared secret between this client and the relay
    pub server_password: String,
    /// Module password, needed by some vehicle commands
    #[serde(default)]
    pub module_password: String,
}

impl std::fmt::Debug for VehicleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VehicleConfig")
            .field("id", &self.id)
            .field("server_password", &"<redacted>")
            .field("module_password", &"<redacted>")
            .finish()
    }
}

/// Session loop timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Keep-alive ping interval in seconds
    #[serde(default = "default_ping_interval")]
    pub ping_interval_secs: u64,
    /// TCP connect timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
    /// Handshake response timeout in milliseconds
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout_ms: u64,
    /// Progress event channel capacity
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

fn default_ping_interval() -> u64 {
    300
}

fn default_connect_timeout() -> u64 {
    10_000
}

fn default_handshake_timeout() -> u64 {
    10_000
}

fn default_event_capacity() -> usize {
    256
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ping_interval_secs: default_ping_interval(),
            connect_timeout_ms: default_connect_timeout(),
            handshake_timeout_ms: default_handshake_timeout(),
            event_capacity: default_event_capacity(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }
}

/// Backoff between consecutive failed connection attempts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

fn default_initial_delay() -> u64 {
    1000
}

fn default_max_delay() -> u64 {
    60_000
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

impl ReconnectConfig {
    /// Delay before the next attempt after `failures` consecutive failures
    pub fn delay(&self, failures: u32) -> Duration {
        if failures == 0 {
            return Duration::ZERO;
        }
        let factor = 1u64 << (failures - 1).min(16);
        let ms = self
            .initial_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);
        Duration::from_millis(ms)
    }
}

/// Everything needed for one connection attempt
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub host: String,
    pub port: u16,
    pub vehicle_id: String,
    pub server_password: String,
    pub module_password: String,
}

impl Credentials {
    pub fn new(
        vehicle_id: impl Into<String>,
        server_password: impl Into<String>,
        module_password: impl Into<String>,
    ) -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            vehicle_id: vehicle_id.into(),
            server_password: server_password.into(),
            module_password: module_password.into(),
        }
    }

    pub fn with_server(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("vehicle_id", &self.vehicle_id)
            .field("server_password", &"<redacted>")
            .field("module_password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = ClientConfig::from_toml_str(
            r#"
            [vehicle]
            id = "DEMO"
            server_password = "pw"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.host, "tmc.openvehicles.com");
        assert_eq!(config.server.port, 6867);
        assert_eq!(config.session.ping_interval_secs, 300);
        assert_eq!(config.session.reconnect.max_delay_ms, 60_000);
        assert_eq!(config.vehicle.module_password, "");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [server]
            host = "relay.local"
            port = 7000

            [vehicle]
            id = "TEST1"
            server_password = "pw"
            module_password = "mod"

            [session]
            ping_interval_secs = 60
            "#
        )
        .unwrap();

        let config = ClientConfig::load(file.path()).unwrap();
        let creds = config.credentials();
        assert_eq!(creds.host, "relay.local");
        assert_eq!(creds.port, 7000);
        assert_eq!(creds.vehicle_id, "TEST1");
        assert_eq!(config.session.ping_interval(), Duration::from_secs(60));
        assert_eq!(config.session.connect_timeout_ms, 10_000);
    }

    #[test]
    fn test_missing_vehicle_is_an_error() {
        assert!(matches!(
            ClientConfig::from_toml_str("[server]\nport = 1\n"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            ClientConfig::load("/nonexistent/ovms.toml"),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_debug_redacts_passwords() {
        let creds = Credentials::new("DEMO", "hunter2", "1234");
        let printed = format!("{:?}", creds);
        assert!(printed.contains("DEMO"));
        assert!(!printed.contains("hunter2"));
        assert!(!printed.contains("1234"));
    }

    #[test]
    fn test_backoff_delay() {
        let reconnect = ReconnectConfig {
            initial_delay_ms: 100,
            max_delay_ms: 1000,
        };
        assert_eq!(reconnect.delay(0), Duration::ZERO);
        assert_eq!(reconnect.delay(1), Duration::from_millis(100));
        assert_eq!(reconnect.delay(2), Duration::from_millis(200));
        assert_eq!(reconnect.delay(4), Duration::from_millis(800));
        assert_eq!(reconnect.delay(5), Duration::from_millis(1000));
        assert_eq!(reconnect.delay(100), Duration::from_millis(1000));
    }
}
