//! Shared application state for axum handlers.

use std::sync::Arc;

use sensorhub_app::controller::AggregationController;
use sensorhub_app::ports::SensorGateway;

/// Application state shared across all axum handlers.
///
/// Generic over the sensor gateway to avoid dynamic dispatch. `Clone` is
/// implemented manually so the gateway itself does not need to be `Clone`;
/// only the `Arc` is cloned.
pub struct AppState<G> {
    /// Dashboard use-case driving every sensor.
    pub controller: Arc<AggregationController<G>>,
}

impl<G> Clone for AppState<G> {
    fn clone(&self) -> Self {
        Self {
            controller: Arc::clone(&self.controller),
        }
    }
}

impl<G: SensorGateway> AppState<G> {
    /// Create a new application state from a controller.
    #[must_use]
    pub fn new(controller: AggregationController<G>) -> Self {
        Self::from_arc(Arc::new(controller))
    }

    /// Create a new application state from a shared controller.
    ///
    /// Use this when the controller must also be reachable outside of
    /// the HTTP layer, e.g. to shut it down once the server stops.
    #[must_use]
    pub fn from_arc(controller: Arc<AggregationController<G>>) -> Self {
        Self { controller }
    }
}
