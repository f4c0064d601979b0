//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `sensorhub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;

use sensorhub_adapter_simulated::SimulationConfig;
use sensorhub_app::hub::DEFAULT_CHANNEL_CAPACITY;
use sensorhub_app::registry::RegistryConfig;
use sensorhub_domain::id::SourceId;

const CONFIG_FILE: &str = "sensorhub.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Sensor connection and fan-out settings.
    pub hub: HubConfig,
    /// Behaviour of the simulated sensors.
    pub simulation: SimulationConfig,
    /// Dashboard start-up state.
    pub dashboard: DashboardConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Broadcast hub configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Extra connection attempts after the first failure.
    pub connection_retry_count: u32,
    /// Pause between connection attempts, in milliseconds.
    pub retry_delay_ms: u64,
    /// Measurements buffered per sensor for slow subscribers.
    pub channel_capacity: usize,
}

/// Dashboard configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Sensors enabled as soon as the daemon starts.
    pub enabled_sensors: Vec<SourceId>,
}

impl Config {
    /// Load configuration from `sensorhub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file(CONFIG_FILE)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("SENSORHUB_HOST") {
            self.server.host = val;
        }
        if let Some(val) = var("SENSORHUB_PORT")
            && let Ok(port) = val.parse()
        {
            self.server.port = port;
        }
        if let Some(val) = var("SENSORHUB_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("SENSORHUB_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.hub.channel_capacity == 0 {
            return Err(ConfigError::Validation(
                "hub channel capacity must be non-zero".to_string(),
            ));
        }
        let rates = [
            ("connect_failure_rate", self.simulation.connect_failure_rate),
            ("read_failure_rate", self.simulation.read_failure_rate),
        ];
        for (name, rate) in rates {
            if !(0.0..=1.0).contains(&rate) {
                return Err(ConfigError::Validation(format!(
                    "simulation {name} must be within [0, 1], got {rate}"
                )));
            }
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Retry policy handed to the source registry.
    #[must_use]
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            connection_retry_count: self.hub.connection_retry_count,
            retry_delay: Duration::from_millis(self.hub.retry_delay_ms),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "sensorhubd=info,sensorhub=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        let registry = RegistryConfig::default();
        Self {
            connection_retry_count: registry.connection_retry_count,
            retry_delay_ms: 0,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.hub.connection_retry_count, 3);
        assert_eq!(config.hub.retry_delay_ms, 0);
        assert_eq!(config.hub.channel_capacity, 10);
        assert_eq!(config.simulation.max_latency_ms, 100);
        assert!(config.dashboard.enabled_sensors.is_empty());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [server]
            host = '127.0.0.1'
            port = 9090

            [logging]
            filter = 'debug'

            [hub]
            connection_retry_count = 5
            retry_delay_ms = 20
            channel_capacity = 32

            [simulation]
            max_latency_ms = 10
            connect_failure_rate = 0.1
            read_failure_rate = 0.2
            failing_sensors = ['light']

            [dashboard]
            enabled_sensors = ['noise', 'movement']
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.hub.channel_capacity, 32);
        assert_eq!(config.simulation.failing_sensors, vec![SourceId::light()]);
        assert_eq!(
            config.dashboard.enabled_sensors,
            vec![SourceId::noise(), SourceId::movement()]
        );

        let registry = config.registry_config();
        assert_eq!(registry.connection_retry_count, 5);
        assert_eq!(registry.retry_delay, Duration::from_millis(20));
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_zero_channel_capacity() {
        let mut config = Config::default();
        config.hub.channel_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_failure_rate_out_of_range() {
        let mut config = Config::default();
        config.simulation.read_failure_rate = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("read_failure_rate"));
    }

    #[test]
    fn should_accept_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn should_format_bind_addr() {
        let config = Config::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn should_override_server_from_environment() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("SENSORHUB_HOST", "10.0.0.1"), ("SENSORHUB_PORT", "8080")]));
        assert_eq!(config.bind_addr(), "10.0.0.1:8080");
    }

    #[test]
    fn should_prefer_bind_over_host_and_port() {
        let mut config = Config::default();
        config.apply_overrides(env(&[
            ("SENSORHUB_HOST", "10.0.0.1"),
            ("SENSORHUB_BIND", "127.0.0.1:4000"),
        ]));
        assert_eq!(config.bind_addr(), "127.0.0.1:4000");
    }

    #[test]
    fn should_ignore_unparsable_port() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("SENSORHUB_PORT", "not-a-port")]));
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_let_rust_log_win_over_sensorhub_log() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("SENSORHUB_LOG", "warn"), ("RUST_LOG", "trace")]));
        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_reject_blank_enabled_sensor() {
        let result: Result<Config, _> = toml::from_str("[dashboard]\nenabled_sensors = ['']");
        assert!(result.is_err());
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
