//! # sensorhub-app
//!
//! Application layer: the sensor-sharing core and its **port definitions**.
//!
//! ## Responsibilities
//! - Define the **driven port** adapters must implement:
//!   - `SensorGateway`: blocking address lookup and single-measurement reads
//! - Provide the in-process machinery that multiplexes sensors:
//!   - `MeasurementSource`: endless stream of readings from one sensor
//!   - `SourceRegistry`: connects each sensor once, with bounded retries
//!   - `BroadcastHub`: shares one poll loop per sensor between any number of
//!     subscribers and starts/stops it from the subscriber count
//!   - `AggregationController`: the driving use-case: toggle sensors and
//!     observe the combined, per-sensor time series
//!
//! ## Dependency rule
//! Depends on `sensorhub-domain` only (plus `tokio` primitives for tasks and
//! channels). Never imports adapter crates. Adapters depend on *this* crate,
//! not the reverse.

pub mod controller;
pub mod hub;
pub mod ports;
pub mod registry;
pub mod source;

mod sync;

#[cfg(test)]
mod testing;
