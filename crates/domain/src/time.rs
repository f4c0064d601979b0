//! Time and timestamp helpers.

use chrono::Utc;

/// Milliseconds since the Unix epoch, the unit carried by every measurement.
pub type Timestamp = i64;

/// Return the current UTC time in milliseconds.
#[must_use]
pub fn now_millis() -> Timestamp {
    Utc::now().timestamp_millis()
}
