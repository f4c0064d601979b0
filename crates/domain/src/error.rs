//! Common error types used across the workspace.
//!
//! Transient errors come from the environment (configuration server, sensor
//! reads). The core recovers from them locally and only surfaces the typed,
//! terminal errors wrapped by [`SensorHubError`].

use crate::id::SourceId;

/// Base error type propagated across port boundaries.
#[derive(Debug, thiserror::Error)]
pub enum SensorHubError {
    /// Input rejected by a domain invariant.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A sensor could not be connected, retries included.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// The hub was shut down and accepts no new work.
    #[error(transparent)]
    Disposed(#[from] HubDisposedError),
}

/// Domain validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A sensor identifier was empty or blank.
    #[error("sensor identifier must not be empty")]
    EmptySourceId,
}

/// A single attempt to fetch a sensor address failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("configuration server unavailable: {reason}")]
pub struct TransientConnectionError {
    pub reason: String,
}

impl TransientConnectionError {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A single measurement read failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("sensor temporarily unavailable: {reason}")]
pub struct TransientReadError {
    pub reason: String,
}

impl TransientReadError {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Resolution of a sensor failed on every allowed attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to connect to sensor `{source_id}` after {attempts} attempt(s)")]
pub struct ConnectionError {
    pub source_id: SourceId,
    pub attempts: u32,
    #[source]
    pub last_error: TransientConnectionError,
}

/// An operation was attempted after the hub was torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("sensor hub has been disposed")]
pub struct HubDisposedError;
