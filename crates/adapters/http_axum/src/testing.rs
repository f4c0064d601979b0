//! Gateway double and state builder shared by the handler tests.

use std::sync::Arc;
use std::time::Duration;

use sensorhub_app::controller::AggregationController;
use sensorhub_app::hub::BroadcastHub;
use sensorhub_app::ports::SensorGateway;
use sensorhub_app::registry::{RegistryConfig, SourceRegistry};
use sensorhub_domain::error::{TransientConnectionError, TransientReadError};
use sensorhub_domain::id::{SensorAddress, SourceId};

use crate::state::AppState;

/// Gateway that connects every sensor except the `unreachable` ones.
pub(crate) struct StubGateway {
    unreachable: Vec<SourceId>,
}

impl SensorGateway for StubGateway {
    fn fetch_address(&self, id: &SourceId) -> Result<SensorAddress, TransientConnectionError> {
        if self.unreachable.contains(id) {
            return Err(TransientConnectionError::new("no route to sensor"));
        }
        Ok(SensorAddress::new(format!("stub://{id}")))
    }

    fn read_measurement(&self, _address: &SensorAddress) -> Result<f32, TransientReadError> {
        std::thread::sleep(Duration::from_millis(2));
        Ok(0.5)
    }
}

pub(crate) fn test_state(unreachable: Vec<SourceId>) -> AppState<StubGateway> {
    let registry = SourceRegistry::new(
        Arc::new(StubGateway { unreachable }),
        RegistryConfig {
            connection_retry_count: 1,
            ..RegistryConfig::default()
        },
    );
    let hub = Arc::new(BroadcastHub::new(registry, 10));
    AppState::new(AggregationController::new(hub))
}
