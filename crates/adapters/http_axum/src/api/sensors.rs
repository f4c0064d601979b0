//! JSON handlers for sensor toggles.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use sensorhub_app::ports::SensorGateway;
use sensorhub_domain::error::SensorHubError;
use sensorhub_domain::id::SourceId;

use crate::error::ApiError;
use crate::state::AppState;

/// Interest in one sensor after a toggle.
#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleBody {
    pub id: SourceId,
    pub enabled: bool,
}

/// Possible responses from the toggle endpoint.
pub enum ToggleResponse {
    Ok(Json<ToggleBody>),
}

impl IntoResponse for ToggleResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `POST /api/sensors/:id/toggle`
pub async fn toggle<G: SensorGateway>(
    State(state): State<AppState<G>>,
    Path(id): Path<String>,
) -> Result<ToggleResponse, ApiError> {
    let id = SourceId::new(id).map_err(SensorHubError::from)?;
    let enabled = state.controller.toggle(&id).await?;
    Ok(ToggleResponse::Ok(Json(ToggleBody { id, enabled })))
}
