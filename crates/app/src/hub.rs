//! Broadcast hub: one poll loop per sensor, shared by every subscriber.
//!
//! The hub wraps each resolved [`MeasurementSource`] with a tokio
//! [`broadcast`] channel and counts the live [`Subscription`]s on it:
//!
//! - the first subscriber (count `0 → 1`) starts the production task that
//!   pulls from the source and republishes every measurement;
//! - dropping the last subscriber (count `1 → 0`) stops the source, which
//!   ends the production task within one read cycle;
//! - the entry itself stays, so the next subscriber restarts production on
//!   the cached source without reconnecting.
//!
//! The count and the production handle live behind one mutex per entry, so
//! both edges are detected by a single writer.
//!
//! Slow subscribers never stall the producer: the channel keeps the newest
//! `channel_capacity` values and a lagging subscriber skips the oldest ones.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex, Weak};
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt as _;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use sensorhub_domain::error::{HubDisposedError, SensorHubError};
use sensorhub_domain::id::SourceId;
use sensorhub_domain::measurement::Measurement;

use crate::ports::SensorGateway;
use crate::registry::SourceRegistry;
use crate::source::MeasurementSource;
use crate::sync::lock;

/// Default number of measurements buffered per sensor.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 10;

/// Multicasts sensor measurements and drives each sensor from demand.
pub struct BroadcastHub<G> {
    registry: SourceRegistry<G>,
    channel_capacity: usize,
    inner: Mutex<HubInner<G>>,
}

struct HubInner<G> {
    entries: HashMap<SourceId, Arc<SourceEntry<G>>>,
    disposed: bool,
}

impl<G: SensorGateway> BroadcastHub<G> {
    /// Create a hub on top of `registry`.
    ///
    /// A `channel_capacity` of zero is raised to one.
    #[must_use]
    pub fn new(registry: SourceRegistry<G>, channel_capacity: usize) -> Self {
        Self {
            registry,
            channel_capacity: channel_capacity.max(1),
            inner: Mutex::new(HubInner {
                entries: HashMap::new(),
                disposed: false,
            }),
        }
    }

    /// Subscribe to the measurements of `id`, connecting it on first use.
    ///
    /// The subscription only sees measurements produced after this call.
    ///
    /// # Errors
    ///
    /// Returns [`SensorHubError::Connection`] when the sensor cannot be
    /// resolved and [`SensorHubError::Disposed`] after [`shutdown`](Self::shutdown).
    pub async fn subscribe(&self, id: &SourceId) -> Result<Subscription, SensorHubError> {
        let existing = {
            let inner = lock(&self.inner);
            if inner.disposed {
                return Err(HubDisposedError.into());
            }
            inner.entries.get(id).map(|entry| Arc::clone(&entry.source))
        };

        let source = match existing {
            Some(source) => source,
            None => self.registry.resolve(id).await?,
        };

        let mut inner = lock(&self.inner);
        if inner.disposed {
            return Err(HubDisposedError.into());
        }
        let capacity = self.channel_capacity;
        let entry = Arc::clone(
            inner
                .entries
                .entry(id.clone())
                .or_insert_with(|| Arc::new(SourceEntry::new(source, capacity))),
        );
        let receiver = entry.sender.subscribe();
        let subscribers = entry.attach();
        drop(inner);

        tracing::debug!(source_id = %id, subscribers, "subscriber attached");
        Ok(Subscription::new(id.clone(), receiver, &entry))
    }

    /// Number of live subscriptions on `id`.
    #[must_use]
    pub fn subscriber_count(&self, id: &SourceId) -> usize {
        lock(&self.inner)
            .entries
            .get(id)
            .map_or(0, |entry| entry.subscriber_count())
    }

    /// Whether a production task for `id` is currently alive.
    #[must_use]
    pub fn is_producing(&self, id: &SourceId) -> bool {
        lock(&self.inner)
            .entries
            .get(id)
            .is_some_and(|entry| entry.is_producing())
    }

    #[must_use]
    pub fn registry(&self) -> &SourceRegistry<G> {
        &self.registry
    }

    /// Stop every production task and release all sensors.
    ///
    /// Returns once every task has terminated. Live subscriptions end, and
    /// any later [`subscribe`](Self::subscribe) fails with
    /// [`SensorHubError::Disposed`].
    pub async fn shutdown(&self) {
        let entries: Vec<_> = {
            let mut inner = lock(&self.inner);
            inner.disposed = true;
            inner.entries.drain().map(|(_, entry)| entry).collect()
        };

        for entry in entries {
            if let Some(handle) = entry.halt() {
                handle.abort();
                if let Err(err) = handle.await
                    && err.is_panic()
                {
                    tracing::error!(source_id = %entry.source.id(), %err, "production task panicked");
                }
            }
        }

        self.registry.clear();
        tracing::info!("sensor hub shut down");
    }
}

struct SourceEntry<G> {
    source: Arc<MeasurementSource<G>>,
    sender: broadcast::Sender<Measurement>,
    state: Mutex<EntryState>,
}

#[derive(Default)]
struct EntryState {
    subscribers: usize,
    production: Option<JoinHandle<()>>,
}

impl<G: SensorGateway> SourceEntry<G> {
    fn new(source: Arc<MeasurementSource<G>>, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            source,
            sender,
            state: Mutex::new(EntryState::default()),
        }
    }

    /// Count one more subscriber, starting production on the `0 → 1` edge.
    fn attach(&self) -> usize {
        let mut state = lock(&self.state);
        state.subscribers += 1;
        if state.subscribers == 1 {
            if let Some(previous) = state.production.take() {
                previous.abort();
            }
            state.production = Some(self.spawn_production());
            tracing::info!(source_id = %self.source.id(), "sensor production started");
        }
        state.subscribers
    }

    /// Count one subscriber less, stopping the source on the `1 → 0` edge.
    fn detach(&self) {
        let mut state = lock(&self.state);
        state.subscribers = state.subscribers.saturating_sub(1);
        if state.subscribers == 0 {
            self.source.stop();
            tracing::info!(source_id = %self.source.id(), "sensor production stopped");
        }
    }

    /// Stop the source and hand back the production task, if any.
    fn halt(&self) -> Option<JoinHandle<()>> {
        let mut state = lock(&self.state);
        self.source.stop();
        state.production.take()
    }

    fn subscriber_count(&self) -> usize {
        lock(&self.state).subscribers
    }

    fn is_producing(&self) -> bool {
        lock(&self.state)
            .production
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn spawn_production(&self) -> JoinHandle<()> {
        let measurements = self.source.produce();
        let sender = self.sender.clone();
        let id = self.source.id().clone();

        tokio::spawn(async move {
            let mut measurements = std::pin::pin!(measurements);
            while let Some(measurement) = measurements.next().await {
                // Fails only when every receiver is gone; the detach edge
                // stops the source right after.
                let _ = sender.send(measurement);
            }
            tracing::debug!(source_id = %id, "production loop finished");
        })
    }
}

trait Detach: Send + Sync {
    fn detach(&self);
}

impl<G: SensorGateway> Detach for SourceEntry<G> {
    fn detach(&self) {
        SourceEntry::detach(self);
    }
}

/// Decrements the subscriber count when the subscription is dropped.
struct SubscriberGuard {
    entry: Weak<dyn Detach>,
}

impl Drop for SubscriberGuard {
    fn drop(&mut self) {
        if let Some(entry) = self.entry.upgrade() {
            entry.detach();
        }
    }
}

/// A live view onto one sensor's broadcast.
///
/// Yields measurements in production order. Dropping it releases the
/// subscriber slot immediately. The stream ends when the hub shuts down.
pub struct Subscription {
    source_id: SourceId,
    measurements: Pin<Box<dyn Stream<Item = Measurement> + Send>>,
    _guard: SubscriberGuard,
}

impl Subscription {
    fn new<G: SensorGateway>(
        source_id: SourceId,
        receiver: broadcast::Receiver<Measurement>,
        entry: &Arc<SourceEntry<G>>,
    ) -> Self {
        let lagging_id = source_id.clone();
        let measurements = BroadcastStream::new(receiver).filter_map(move |item| match item {
            Ok(measurement) => Some(measurement),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::debug!(
                    source_id = %lagging_id,
                    skipped,
                    "subscriber lagged, oldest measurements dropped"
                );
                None
            }
        });

        let entry: Weak<SourceEntry<G>> = Arc::downgrade(entry);
        let entry: Weak<dyn Detach> = entry;
        Self {
            source_id,
            measurements: Box::pin(measurements),
            _guard: SubscriberGuard { entry },
        }
    }

    #[must_use]
    pub fn source_id(&self) -> &SourceId {
        &self.source_id
    }
}

impl Stream for Subscription {
    type Item = Measurement;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.measurements.as_mut().poll_next(cx)
    }
}
