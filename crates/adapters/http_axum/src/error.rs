//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use sensorhub_domain::error::SensorHubError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`SensorHubError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(SensorHubError);

impl From<SensorHubError> for ApiError {
    fn from(err: SensorHubError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SensorHubError::Validation(_) => StatusCode::BAD_REQUEST,
            SensorHubError::Connection(err) => {
                tracing::warn!(source_id = %err.source_id, error = %err, "sensor unreachable");
                StatusCode::BAD_GATEWAY
            }
            SensorHubError::Disposed(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}
