//! Dashboard state: what the operator has enabled and what has been measured.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::SourceId;
use crate::measurement::Measurement;
use crate::series::CombinedSeries;

/// Which sensors the operator currently wants active.
pub type InterestState = BTreeMap<SourceId, bool>;

/// A toggle that could not be completed, kept so the UI can show it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleFailure {
    pub source_id: SourceId,
    pub message: String,
}

/// Snapshot published to observers after every change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardState {
    pub sensors: InterestState,
    /// Combined measurements from every sensor enabled at some point.
    pub measurements: CombinedSeries,
    pub last_error: Option<ToggleFailure>,
}

impl DashboardState {
    #[must_use]
    pub fn is_enabled(&self, id: &SourceId) -> bool {
        self.sensors.get(id).copied().unwrap_or(false)
    }

    /// Record a confirmed interest change.
    ///
    /// Enabling also creates the series line so the sensor shows up on the
    /// chart before its first reading arrives.
    pub fn set_enabled(&mut self, id: &SourceId, enabled: bool) {
        self.sensors.insert(id.clone(), enabled);
        if enabled {
            self.measurements.ensure(id);
            self.last_error = None;
        }
    }

    pub fn record(&mut self, id: &SourceId, measurement: Measurement) {
        self.measurements.append(id, measurement);
    }

    pub fn record_failure(&mut self, id: &SourceId, message: impl Into<String>) {
        self.last_error = Some(ToggleFailure {
            source_id: id.clone(),
            message: message.into(),
        });
    }
}
