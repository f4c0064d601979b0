//! JSON API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod dashboard;
#[allow(clippy::missing_errors_doc)]
pub mod sensors;
pub mod sse;

use axum::Router;
use axum::routing::{get, post};

use sensorhub_app::ports::SensorGateway;

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<G: SensorGateway>() -> Router<AppState<G>> {
    Router::new()
        .route("/dashboard", get(dashboard::get::<G>))
        .route("/dashboard/stream", get(sse::stream::<G>))
        .route("/sensors/{id}/toggle", post(sensors::toggle::<G>))
}
