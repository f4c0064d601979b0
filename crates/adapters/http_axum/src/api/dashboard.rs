//! JSON handler for the dashboard snapshot.

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};

use sensorhub_app::ports::SensorGateway;
use sensorhub_domain::dashboard::DashboardState;

use crate::state::AppState;

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<DashboardState>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/dashboard`
pub async fn get<G: SensorGateway>(State(state): State<AppState<G>>) -> GetResponse {
    GetResponse::Ok(Json(state.controller.snapshot()))
}
