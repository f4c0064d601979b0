//! Typed identifier newtypes for sensors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Well-known identifier of the noise sensor.
pub const NOISE_SENSOR: &str = "noise";
/// Well-known identifier of the light sensor.
pub const LIGHT_SENSOR: &str = "light";
/// Well-known identifier of the movement sensor.
pub const MOVEMENT_SENSOR: &str = "movement";

/// Opaque key identifying one sensor (e.g. `"noise"`).
///
/// Any non-blank string is accepted; the well-known constants above are a
/// convenience, not a closed set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SourceId(String);

impl SourceId {
    /// Build an identifier, rejecting blank input.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptySourceId`] when `value` is empty or
    /// only whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::EmptySourceId);
        }
        Ok(Self(value))
    }

    /// The noise sensor.
    #[must_use]
    pub fn noise() -> Self {
        Self(NOISE_SENSOR.to_string())
    }

    /// The light sensor.
    #[must_use]
    pub fn light() -> Self {
        Self(LIGHT_SENSOR.to_string())
    }

    /// The movement sensor.
    #[must_use]
    pub fn movement() -> Self {
        Self(MOVEMENT_SENSOR.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SourceId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SourceId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SourceId> for String {
    fn from(id: SourceId) -> Self {
        id.0
    }
}

/// Network address of a sensor, as returned by the configuration server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SensorAddress(String);

impl SensorAddress {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SensorAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
