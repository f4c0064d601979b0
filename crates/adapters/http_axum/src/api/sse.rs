//! Server-Sent Events (SSE) stream of dashboard updates.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::StreamExt;

use sensorhub_app::ports::SensorGateway;

use crate::state::AppState;

/// `GET /api/dashboard/stream`: SSE stream of dashboard states.
///
/// The first frame carries the current state, then one frame follows every
/// change. Bursts of changes are coalesced: a slow client only receives the
/// latest state. Each frame is the JSON-encoded `DashboardState`.
pub async fn stream<G: SensorGateway>(
    State(state): State<AppState<G>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>> {
    let updates = state
        .controller
        .observe()
        .filter_map(|dashboard| match serde_json::to_string(&dashboard) {
            Ok(json) => Some(Ok(Event::default().data(json))),
            Err(err) => {
                tracing::warn!(%err, "failed to serialize dashboard to JSON for SSE stream");
                None
            }
        });

    Sse::new(updates).keep_alive(KeepAlive::default())
}
