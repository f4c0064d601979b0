//! Aggregation controller: the dashboard use-case.
//!
//! Turns toggle requests into hub subscriptions and folds the measurements of
//! every enabled sensor into one [`DashboardState`], published through a
//! tokio [`watch`] channel. Each enabled sensor has one collector task that
//! appends its measurements; disabling the sensor cancels that task, which
//! drops the subscription and lets the hub stop polling.
//!
//! Interest only flips to "on" once the sensor is actually connected. A
//! failed connection leaves the interest unchanged and is reported through
//! [`DashboardState::last_error`].
//!
//! Toggles of one sensor are serialized on that sensor's slot. Toggles of
//! different sensors never wait on each other, even while one is connecting.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt as _;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;

use sensorhub_domain::dashboard::DashboardState;
use sensorhub_domain::error::SensorHubError;
use sensorhub_domain::id::SourceId;

use crate::hub::{BroadcastHub, Subscription};
use crate::ports::SensorGateway;
use crate::sync::lock;

/// The collector of one sensor, if enabled.
type Slot = Arc<tokio::sync::Mutex<Option<Collector>>>;

/// Dashboard use-case: enable/disable sensors and observe their data.
pub struct AggregationController<G> {
    hub: Arc<BroadcastHub<G>>,
    state: Arc<watch::Sender<DashboardState>>,
    slots: Mutex<HashMap<SourceId, Slot>>,
}

struct Collector {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Collector {
    async fn stop(self, id: &SourceId) {
        self.cancel.cancel();
        if let Err(err) = self.handle.await
            && err.is_panic()
        {
            tracing::error!(source_id = %id, %err, "collector task panicked");
        }
    }
}

impl<G: SensorGateway> AggregationController<G> {
    /// Create a controller with nothing enabled.
    #[must_use]
    pub fn new(hub: Arc<BroadcastHub<G>>) -> Self {
        let (state, _) = watch::channel(DashboardState::default());
        Self {
            hub,
            state: Arc::new(state),
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Flip the interest in `id` and return the new interest.
    ///
    /// Enabling waits until the sensor is connected; disabling returns once
    /// the collector has stopped and released its subscription.
    ///
    /// # Errors
    ///
    /// Returns the hub error when enabling fails. The interest in `id` is
    /// left untouched and the failure is published in
    /// [`DashboardState::last_error`].
    pub async fn toggle(&self, id: &SourceId) -> Result<bool, SensorHubError> {
        let slot = Arc::clone(lock(&self.slots).entry(id.clone()).or_default());
        let mut collector = slot.lock().await;

        let outcome = if let Some(running) = collector.take() {
            running.stop(id).await;
            self.state.send_modify(|state| state.set_enabled(id, false));
            tracing::info!(source_id = %id, "sensor disabled");
            Ok(false)
        } else {
            match self.hub.subscribe(id).await {
                Ok(subscription) => {
                    self.state.send_modify(|state| state.set_enabled(id, true));
                    *collector = Some(self.spawn_collector(subscription));
                    tracing::info!(source_id = %id, "sensor enabled");
                    Ok(true)
                }
                Err(err) => {
                    tracing::warn!(source_id = %id, %err, "failed to enable sensor");
                    self.state
                        .send_modify(|state| state.record_failure(id, err.to_string()));
                    Err(err)
                }
            }
        };

        if collector.is_none() {
            self.release_slot(id, &slot);
        }
        outcome
    }

    /// Enable every sensor in `ids` that is not enabled yet.
    ///
    /// Failures are logged and published like any failed toggle; the
    /// remaining sensors are still attempted. Returns how many were enabled.
    pub async fn restore(&self, ids: impl IntoIterator<Item = SourceId>) -> usize {
        let mut enabled = 0;
        for id in ids {
            if self.is_enabled(&id) {
                continue;
            }
            if matches!(self.toggle(&id).await, Ok(true)) {
                enabled += 1;
            }
        }
        enabled
    }

    #[must_use]
    pub fn is_enabled(&self, id: &SourceId) -> bool {
        self.state.borrow().is_enabled(id)
    }

    /// Clone of the latest published state.
    #[must_use]
    pub fn snapshot(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    /// Live stream of published states, starting with the current one.
    #[must_use]
    pub fn observe(&self) -> WatchStream<DashboardState> {
        WatchStream::new(self.state.subscribe())
    }

    #[must_use]
    pub fn hub(&self) -> &Arc<BroadcastHub<G>> {
        &self.hub
    }

    /// Shut the hub down, then stop every collector and clear the interest.
    ///
    /// The hub goes first so that a toggle still connecting fails with
    /// [`SensorHubError::Disposed`] instead of enabling a sensor.
    pub async fn shutdown(&self) {
        self.hub.shutdown().await;

        let slots: Vec<_> = lock(&self.slots).drain().collect();
        for (id, slot) in slots {
            if let Some(collector) = slot.lock().await.take() {
                collector.stop(&id).await;
            }
        }

        self.state.send_modify(|state| {
            for enabled in state.sensors.values_mut() {
                *enabled = false;
            }
        });
        tracing::info!("aggregation controller shut down");
    }

    /// Forget an empty slot unless another toggle holds it. Toggles clone
    /// the slot under the map lock, so the count is stable while it is held.
    fn release_slot(&self, id: &SourceId, slot: &Slot) {
        let mut slots = lock(&self.slots);
        if let Some(current) = slots.get(id)
            && Arc::ptr_eq(current, slot)
            && Arc::strong_count(slot) == 2
        {
            slots.remove(id);
        }
    }

    #[cfg(test)]
    fn tracked_slots(&self) -> usize {
        lock(&self.slots).len()
    }

    fn spawn_collector(&self, mut subscription: Subscription) -> Collector {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let state = Arc::clone(&self.state);

        let handle = tokio::spawn(async move {
            let id = subscription.source_id().clone();
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    next = subscription.next() => match next {
                        Some(measurement) => {
                            state.send_modify(|state| state.record(&id, measurement));
                        }
                        None => {
                            tracing::debug!(source_id = %id, "sensor subscription closed");
                            break;
                        }
                    },
                }
            }
        });

        Collector { cancel, handle }
    }
}
