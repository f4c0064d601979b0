//! # sensorhub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the current dashboard state as JSON (`GET /api/dashboard`)
//! - Turn toggle requests into [`AggregationController::toggle`] calls
//!   (`POST /api/sensors/{id}/toggle`)
//! - Push every new dashboard state to browsers over Server-Sent Events
//!   (`GET /api/dashboard/stream`)
//! - Map application errors into HTTP status codes with a JSON body
//!
//! ## Dependency rule
//! Depends on `sensorhub-app` (for the controller and port trait) and
//! `sensorhub-domain` (for the types it serializes). Never leaks axum types
//! into the domain.
//!
//! [`AggregationController::toggle`]: sensorhub_app::controller::AggregationController::toggle

pub mod api;
pub mod error;
pub mod router;
pub mod state;

#[cfg(test)]
mod testing;
