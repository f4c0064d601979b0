//! # sensorhub-domain
//!
//! Pure domain model for the sensorhub dashboard.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Measurements** (timestamped readings produced by a sensor)
//! - Define **Series** (per-sensor chart lines with a fixed display color)
//! - Define the **Dashboard state** (which sensors are enabled + combined series)
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod dashboard;
pub mod measurement;
pub mod series;
