//! Simulation tuning.

use std::time::Duration;

use serde::Deserialize;

use sensorhub_domain::id::SourceId;

/// How unreliable the simulated sensors are.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Upper bound of the random delay added to every call, in milliseconds.
    pub max_latency_ms: u64,
    /// Probability in `[0, 1]` that an address lookup fails.
    pub connect_failure_rate: f32,
    /// Probability in `[0, 1]` that a single read fails.
    pub read_failure_rate: f32,
    /// Sensors whose reads always fail, e.g. an unplugged device.
    pub failing_sensors: Vec<SourceId>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_latency_ms: 100,
            connect_failure_rate: 0.5,
            read_failure_rate: 0.5,
            failing_sensors: Vec::new(),
        }
    }
}

impl SimulationConfig {
    /// A simulation that never fails and never waits.
    #[must_use]
    pub fn reliable() -> Self {
        Self {
            max_latency_ms: 0,
            connect_failure_rate: 0.0,
            read_failure_rate: 0.0,
            failing_sensors: Vec::new(),
        }
    }

    #[must_use]
    pub fn max_latency(&self) -> Duration {
        Duration::from_millis(self.max_latency_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_flaky_network_sensor() {
        let config = SimulationConfig::default();
        assert_eq!(config.max_latency(), Duration::from_millis(100));
        assert!((config.connect_failure_rate - 0.5).abs() < f32::EPSILON);
        assert!((config.read_failure_rate - 0.5).abs() < f32::EPSILON);
        assert!(config.failing_sensors.is_empty());
    }

    #[test]
    fn should_fill_missing_fields_with_defaults() {
        let config: SimulationConfig = toml::from_str(
            r#"
            read_failure_rate = 0.1
            failing_sensors = ["light"]
            "#,
        )
        .unwrap();

        assert_eq!(config.max_latency_ms, 100);
        assert!((config.read_failure_rate - 0.1).abs() < f32::EPSILON);
        assert_eq!(config.failing_sensors, vec![SourceId::light()]);
    }

    #[test]
    fn should_reject_blank_sensor_identifier() {
        let result: Result<SimulationConfig, _> = toml::from_str(r#"failing_sensors = [" "]"#);
        assert!(result.is_err());
    }
}
