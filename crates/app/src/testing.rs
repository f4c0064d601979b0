//! In-memory gateway doubles shared by the unit tests of this crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use sensorhub_domain::error::{TransientConnectionError, TransientReadError};
use sensorhub_domain::id::{SensorAddress, SourceId};

use crate::ports::SensorGateway;

/// Scriptable gateway that counts every call it receives.
///
/// Successful reads return `n / 1_000_000` where `n` is the 1-based index of
/// the read, so values are strictly increasing in production order.
pub(crate) struct StubGateway {
    connect_failures: AtomicU32,
    fail_reads: bool,
    connect_delay: Duration,
    slow_sensors: HashMap<SourceId, Duration>,
    read_delay: Duration,
    fetch_calls: AtomicU32,
    reads: AtomicU64,
}

impl StubGateway {
    fn build(connect_failures: u32, fail_reads: bool) -> Self {
        Self {
            connect_failures: AtomicU32::new(connect_failures),
            fail_reads,
            connect_delay: Duration::from_millis(5),
            slow_sensors: HashMap::new(),
            read_delay: Duration::from_millis(2),
            fetch_calls: AtomicU32::new(0),
            reads: AtomicU64::new(0),
        }
    }

    pub(crate) fn healthy() -> Self {
        Self::build(0, false)
    }

    /// Fail the first `count` address lookups, then succeed.
    pub(crate) fn flaky_connect(count: u32) -> Self {
        Self::build(count, false)
    }

    /// Never manage to resolve any sensor.
    pub(crate) fn unreachable() -> Self {
        Self::build(u32::MAX, false)
    }

    /// Connect fine but fail every single read.
    pub(crate) fn broken_reads() -> Self {
        Self::build(0, true)
    }

    /// Make every address lookup take `delay`.
    pub(crate) fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    /// Make the address lookup of `id` alone take `delay`.
    pub(crate) fn with_slow_sensor(mut self, id: SourceId, delay: Duration) -> Self {
        self.slow_sensors.insert(id, delay);
        self
    }

    pub(crate) fn fetch_calls(&self) -> u32 {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }
}

impl SensorGateway for StubGateway {
    fn fetch_address(&self, id: &SourceId) -> Result<SensorAddress, TransientConnectionError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.slow_sensors.get(id).copied().unwrap_or(self.connect_delay);
        std::thread::sleep(delay);
        let remaining = self.connect_failures.load(Ordering::SeqCst);
        if remaining == u32::MAX {
            return Err(TransientConnectionError::new("configuration server down"));
        }
        if remaining > 0 {
            self.connect_failures.fetch_sub(1, Ordering::SeqCst);
            return Err(TransientConnectionError::new("configuration server busy"));
        }
        Ok(SensorAddress::new(format!("stub://{id}")))
    }

    #[allow(clippy::cast_precision_loss)]
    fn read_measurement(&self, _address: &SensorAddress) -> Result<f32, TransientReadError> {
        std::thread::sleep(self.read_delay);
        let n = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_reads {
            return Err(TransientReadError::new("sensor unplugged"));
        }
        Ok(n as f32 / 1_000_000.0)
    }
}

/// Poll `condition` until it holds, panicking after `limit`.
pub(crate) async fn wait_until(limit: Duration, mut condition: impl FnMut() -> bool) {
    let polled = tokio::time::timeout(limit, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(polled.is_ok(), "condition not met within {limit:?}");
}
