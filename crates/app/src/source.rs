//! Measurement source: the poll loop of one physical sensor.
//!
//! A [`MeasurementSource`] turns the blocking
//! [`SensorGateway::read_measurement`] call into an endless stream of
//! timestamped [`Measurement`]s. Failed reads are skipped: the data is
//! real-time, so the next iteration is the retry.

use std::sync::{Arc, Mutex};

use futures::Stream;
use tokio_util::sync::CancellationToken;

use sensorhub_domain::id::{SensorAddress, SourceId};
use sensorhub_domain::measurement::{Measurement, MonotonicClock};
use sensorhub_domain::time::{Timestamp, now_millis};

use crate::ports::SensorGateway;
use crate::sync::lock;

/// Wall-clock reading used to stamp measurements.
pub type WallClock = fn() -> Timestamp;

/// One connected sensor.
///
/// Only one stream produced by [`produce`](Self::produce) is live at a time:
/// arming a new one stops the previous one.
pub struct MeasurementSource<G> {
    id: SourceId,
    address: SensorAddress,
    gateway: Arc<G>,
    run: Mutex<CancellationToken>,
    now: WallClock,
    clock: Arc<Mutex<MonotonicClock>>,
}

impl<G: SensorGateway> MeasurementSource<G> {
    /// Wrap a resolved sensor. The source starts stopped.
    #[must_use]
    pub fn new(id: SourceId, address: SensorAddress, gateway: Arc<G>) -> Self {
        Self::with_clock(id, address, gateway, now_millis)
    }

    /// Same as [`new`](Self::new), reading the time from `now`.
    #[must_use]
    pub fn with_clock(id: SourceId, address: SensorAddress, gateway: Arc<G>, now: WallClock) -> Self {
        let idle = CancellationToken::new();
        idle.cancel();
        Self {
            id,
            address,
            gateway,
            run: Mutex::new(idle),
            now,
            clock: Arc::new(Mutex::new(MonotonicClock::default())),
        }
    }

    #[must_use]
    pub fn id(&self) -> &SourceId {
        &self.id
    }

    #[must_use]
    pub fn address(&self) -> &SensorAddress {
        &self.address
    }

    /// Whether the most recently produced stream has not been stopped yet.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !lock(&self.run).is_cancelled()
    }

    /// Signal the live stream to end.
    ///
    /// A read already in flight is allowed to complete, but its value is
    /// discarded: nothing is yielded after this call.
    pub fn stop(&self) {
        lock(&self.run).cancel();
    }

    /// Start a fresh stream of measurements.
    ///
    /// Each step performs one blocking read on tokio's blocking pool.
    /// Timestamps never go backwards for this source, across restarts too.
    pub fn produce(&self) -> impl Stream<Item = Measurement> + Send + use<G> {
        let token = CancellationToken::new();
        {
            let mut run = lock(&self.run);
            run.cancel();
            *run = token.clone();
        }

        let poll = PollState {
            id: self.id.clone(),
            address: self.address.clone(),
            gateway: Arc::clone(&self.gateway),
            token,
            now: self.now,
            clock: Arc::clone(&self.clock),
        };

        futures::stream::unfold(poll, |mut poll| async move {
            let measurement = poll.next_measurement().await?;
            Some((measurement, poll))
        })
    }
}

struct PollState<G> {
    id: SourceId,
    address: SensorAddress,
    gateway: Arc<G>,
    token: CancellationToken,
    now: WallClock,
    clock: Arc<Mutex<MonotonicClock>>,
}

impl<G: SensorGateway> PollState<G> {
    /// Read until one sample succeeds, or return `None` once stopped.
    async fn next_measurement(&mut self) -> Option<Measurement> {
        while !self.token.is_cancelled() {
            let gateway = Arc::clone(&self.gateway);
            let address = self.address.clone();
            let read = tokio::task::spawn_blocking(move || gateway.read_measurement(&address)).await;

            if self.token.is_cancelled() {
                break;
            }

            match read {
                Ok(Ok(value)) => {
                    let timestamp = lock(&self.clock).stamp((self.now)());
                    return Some(Measurement::new(timestamp, value));
                }
                Ok(Err(err)) => {
                    tracing::trace!(source_id = %self.id, %err, "sensor read failed, skipping sample");
                }
                Err(err) => {
                    tracing::error!(source_id = %self.id, %err, "sensor read task aborted");
                    break;
                }
            }
        }
        None
    }
}
