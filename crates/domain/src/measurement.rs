//! Measurement: one timestamped reading from a sensor.

use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// A single reading. Values are expected in `0.0..=1.0`; the range is a
/// guarantee of the sensor, not checked here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Milliseconds since the Unix epoch.
    pub timestamp: Timestamp,
    pub value: f32,
}

impl Measurement {
    #[must_use]
    pub fn new(timestamp: Timestamp, value: f32) -> Self {
        Self { timestamp, value }
    }
}

/// Hands out timestamps that never go backwards, even if the wall clock does.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock {
    last: Option<Timestamp>,
}

impl MonotonicClock {
    /// Clamp `now` so it is at least the previously returned timestamp.
    pub fn stamp(&mut self, now: Timestamp) -> Timestamp {
        let ts = match self.last {
            Some(last) if now < last => last,
            _ => now,
        };
        self.last = Some(ts);
        ts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_pass_through_increasing_timestamps() {
        let mut clock = MonotonicClock::default();
        assert_eq!(clock.stamp(10), 10);
        assert_eq!(clock.stamp(15), 15);
    }

    #[test]
    fn should_clamp_when_wall_clock_goes_backwards() {
        let mut clock = MonotonicClock::default();
        assert_eq!(clock.stamp(100), 100);
        assert_eq!(clock.stamp(90), 100);
        assert_eq!(clock.stamp(101), 101);
    }

    #[test]
    fn should_serialize_measurement_fields() {
        let json = serde_json::to_value(Measurement::new(42, 0.5)).unwrap();
        assert_eq!(json, serde_json::json!({"timestamp": 42, "value": 0.5}));
    }
}
