//! Sensor gateway port: the environment's access to the physical sensors.

use std::sync::Arc;

use sensorhub_domain::error::{TransientConnectionError, TransientReadError};
use sensorhub_domain::id::{SensorAddress, SourceId};

/// Blocking access to the configuration server and the sensors themselves.
///
/// Both operations may block for an unbounded time and may fail
/// transiently. The core only ever calls them from tokio's blocking pool.
pub trait SensorGateway: Send + Sync + 'static {
    /// Ask the configuration server where the sensor `id` lives.
    ///
    /// # Errors
    ///
    /// Returns [`TransientConnectionError`] when the lookup fails; the caller
    /// decides whether to retry.
    fn fetch_address(&self, id: &SourceId) -> Result<SensorAddress, TransientConnectionError>;

    /// Take a single measurement, expected in `0.0..=1.0`.
    ///
    /// # Errors
    ///
    /// Returns [`TransientReadError`] when this sample could not be read.
    fn read_measurement(&self, address: &SensorAddress) -> Result<f32, TransientReadError>;
}

impl<T: SensorGateway + ?Sized> SensorGateway for Arc<T> {
    fn fetch_address(&self, id: &SourceId) -> Result<SensorAddress, TransientConnectionError> {
        (**self).fetch_address(id)
    }

    fn read_measurement(&self, address: &SensorAddress) -> Result<f32, TransientReadError> {
        (**self).read_measurement(address)
    }
}
