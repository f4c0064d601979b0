//! # sensorhub-adapter-simulated
//!
//! Simulated network sensors for development and demonstration.
//!
//! Every call blocks for a random delay up to
//! [`SimulationConfig::max_latency_ms`] and then fails at random with the
//! configured probability, the way a sensor on a flaky network would.
//! Successful reads return a value in `[0, 1)`.
//!
//! | Call | Failure | Success |
//! |------|---------|---------|
//! | `fetch_address` | `connect_failure_rate` | `sim://<id>` |
//! | `read_measurement` | `read_failure_rate`, or always for `failing_sensors` | random `f32` |
//!
//! ## Dependency rule
//!
//! Depends on `sensorhub-app` (port trait) and `sensorhub-domain` only.

mod config;

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use sensorhub_app::ports::SensorGateway;
use sensorhub_domain::error::{TransientConnectionError, TransientReadError};
use sensorhub_domain::id::{SensorAddress, SourceId};

pub use config::SimulationConfig;

const ADDRESS_SCHEME: &str = "sim://";

/// Gateway that makes sensors up.
pub struct SimulatedGateway {
    max_latency: Duration,
    connect_failure_rate: f32,
    read_failure_rate: f32,
    failing: HashSet<String>,
    rng: Mutex<fastrand::Rng>,
}

impl SimulatedGateway {
    #[must_use]
    pub fn new(config: &SimulationConfig) -> Self {
        Self::with_rng(config, fastrand::Rng::new())
    }

    /// Build a gateway whose randomness is reproducible.
    #[must_use]
    pub fn with_seed(config: &SimulationConfig, seed: u64) -> Self {
        Self::with_rng(config, fastrand::Rng::with_seed(seed))
    }

    fn with_rng(config: &SimulationConfig, rng: fastrand::Rng) -> Self {
        Self {
            max_latency: config.max_latency(),
            connect_failure_rate: config.connect_failure_rate.clamp(0.0, 1.0),
            read_failure_rate: config.read_failure_rate.clamp(0.0, 1.0),
            failing: config
                .failing_sensors
                .iter()
                .map(|id| id.as_str().to_owned())
                .collect(),
            rng: Mutex::new(rng),
        }
    }

    fn rng(&self) -> MutexGuard<'_, fastrand::Rng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn simulate_latency(&self) {
        if self.max_latency.is_zero() {
            return;
        }
        let delay = self.rng().u64(0..=millis(self.max_latency));
        std::thread::sleep(Duration::from_millis(delay));
    }

    /// Roll a failure with probability `rate`.
    fn fails(&self, rate: f32) -> bool {
        rate > 0.0 && self.rng().f32() < rate
    }
}

impl SensorGateway for SimulatedGateway {
    fn fetch_address(&self, id: &SourceId) -> Result<SensorAddress, TransientConnectionError> {
        self.simulate_latency();
        if self.fails(self.connect_failure_rate) {
            tracing::trace!(source_id = %id, "simulated configuration server failure");
            return Err(TransientConnectionError::new(
                "configuration server did not answer",
            ));
        }
        Ok(SensorAddress::new(format!("{ADDRESS_SCHEME}{id}")))
    }

    fn read_measurement(&self, address: &SensorAddress) -> Result<f32, TransientReadError> {
        self.simulate_latency();
        let unplugged = address
            .as_str()
            .strip_prefix(ADDRESS_SCHEME)
            .is_some_and(|id| self.failing.contains(id));
        if unplugged {
            return Err(TransientReadError::new("sensor is not responding"));
        }
        if self.fails(self.read_failure_rate) {
            return Err(TransientReadError::new("measurement lost in transit"));
        }
        Ok(self.rng().f32())
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    fn always_failing() -> SimulationConfig {
        SimulationConfig {
            max_latency_ms: 0,
            connect_failure_rate: 1.0,
            read_failure_rate: 1.0,
            failing_sensors: Vec::new(),
        }
    }

    #[test]
    fn should_resolve_address_from_identifier() {
        let gateway = SimulatedGateway::new(&SimulationConfig::reliable());

        let address = gateway.fetch_address(&SourceId::noise()).unwrap();

        assert_eq!(address.as_str(), "sim://noise");
    }

    #[test]
    fn should_read_values_in_unit_range() {
        let gateway = SimulatedGateway::new(&SimulationConfig::reliable());
        let address = gateway.fetch_address(&SourceId::light()).unwrap();

        for _ in 0..100 {
            let value = gateway.read_measurement(&address).unwrap();
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn should_fail_every_call_at_full_failure_rate() {
        let gateway = SimulatedGateway::new(&always_failing());
        let address = SensorAddress::new("sim://noise");

        assert!(gateway.fetch_address(&SourceId::noise()).is_err());
        assert!(gateway.read_measurement(&address).is_err());
    }

    #[test]
    fn should_fail_roughly_at_configured_rate() {
        let config = SimulationConfig {
            max_latency_ms: 0,
            ..SimulationConfig::default()
        };
        let gateway = SimulatedGateway::with_seed(&config, 42);
        let address = SensorAddress::new("sim://movement");

        let failures = (0..1000)
            .filter(|_| gateway.read_measurement(&address).is_err())
            .count();

        assert!((350..650).contains(&failures), "saw {failures} failures");
    }

    #[test]
    fn should_always_fail_reads_of_unplugged_sensors() {
        let config = SimulationConfig {
            failing_sensors: vec![SourceId::light()],
            ..SimulationConfig::reliable()
        };
        let gateway = SimulatedGateway::new(&config);

        let light = gateway.fetch_address(&SourceId::light()).unwrap();
        let noise = gateway.fetch_address(&SourceId::noise()).unwrap();

        assert!((0..20).all(|_| gateway.read_measurement(&light).is_err()));
        assert!(gateway.read_measurement(&noise).is_ok());
    }

    #[test]
    fn should_be_reproducible_with_seed() {
        let config = SimulationConfig {
            max_latency_ms: 0,
            ..SimulationConfig::default()
        };
        let first = SimulatedGateway::with_seed(&config, 7);
        let second = SimulatedGateway::with_seed(&config, 7);
        let address = SensorAddress::new("sim://noise");

        let run = |gateway: &SimulatedGateway| -> Vec<Option<u32>> {
            (0..20)
                .map(|_| gateway.read_measurement(&address).ok().map(f32::to_bits))
                .collect()
        };

        assert_eq!(run(&first), run(&second));
    }

    #[test]
    fn should_wait_no_longer_than_max_latency() {
        let config = SimulationConfig {
            max_latency_ms: 5,
            ..SimulationConfig::reliable()
        };
        let gateway = SimulatedGateway::new(&config);
        let address = SensorAddress::new("sim://noise");

        let started = Instant::now();
        for _ in 0..10 {
            gateway.read_measurement(&address).unwrap();
        }

        assert!(started.elapsed() < Duration::from_millis(500));
    }
}
