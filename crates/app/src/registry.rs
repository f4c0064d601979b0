//! Source registry: resolves sensor identifiers into connected sources.
//!
//! Each identifier is connected at most once per registry: the first
//! successful resolution is cached and every later call returns the same
//! [`MeasurementSource`]. Concurrent resolutions of the same identifier wait
//! on a per-identifier cell, so only one of them talks to the configuration
//! server, while unrelated identifiers resolve in parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::OnceCell;

use sensorhub_domain::error::{ConnectionError, TransientConnectionError};
use sensorhub_domain::id::SourceId;

use crate::ports::SensorGateway;
use crate::source::MeasurementSource;
use crate::sync::lock;

/// Retry policy for sensor resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Extra attempts after the first failure.
    pub connection_retry_count: u32,
    /// Pause between two attempts.
    pub retry_delay: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            connection_retry_count: 3,
            retry_delay: Duration::ZERO,
        }
    }
}

impl RegistryConfig {
    /// Total number of connection attempts per resolution.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.connection_retry_count.saturating_add(1)
    }
}

type SourceCell<G> = Arc<OnceCell<Arc<MeasurementSource<G>>>>;

/// Cache of connected sensors, keyed by identifier.
pub struct SourceRegistry<G> {
    gateway: Arc<G>,
    config: RegistryConfig,
    sources: Mutex<HashMap<SourceId, SourceCell<G>>>,
}

impl<G: SensorGateway> SourceRegistry<G> {
    #[must_use]
    pub fn new(gateway: Arc<G>, config: RegistryConfig) -> Self {
        Self {
            gateway,
            config,
            sources: Mutex::new(HashMap::new()),
        }
    }

    /// Return the connected source for `id`, connecting on first use.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] when every attempt allowed by
    /// [`RegistryConfig`] failed. Nothing is cached in that case, so a later
    /// call starts over.
    pub async fn resolve(&self, id: &SourceId) -> Result<Arc<MeasurementSource<G>>, ConnectionError> {
        let cell = {
            let mut sources = lock(&self.sources);
            Arc::clone(sources.entry(id.clone()).or_default())
        };

        match cell.get_or_try_init(|| self.connect(id)).await {
            Ok(source) => Ok(Arc::clone(source)),
            Err(err) => {
                self.evict_empty(id, &cell);
                Err(err)
            }
        }
    }

    /// The cached source for `id`, without any IO.
    #[must_use]
    pub fn cached(&self, id: &SourceId) -> Option<Arc<MeasurementSource<G>>> {
        lock(&self.sources)
            .get(id)
            .and_then(|cell| cell.get().cloned())
    }

    /// Drop every cached source.
    pub fn clear(&self) {
        lock(&self.sources).clear();
    }

    /// Forget the cell of a failed resolution unless another caller still
    /// waits on it. Callers clone the cell under the map lock, so the count
    /// is stable while that lock is held.
    fn evict_empty(&self, id: &SourceId, cell: &SourceCell<G>) {
        let mut sources = lock(&self.sources);
        if let Some(current) = sources.get(id)
            && Arc::ptr_eq(current, cell)
            && !cell.initialized()
            && Arc::strong_count(cell) == 2
        {
            sources.remove(id);
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        lock(&self.sources).len()
    }

    async fn connect(&self, id: &SourceId) -> Result<Arc<MeasurementSource<G>>, ConnectionError> {
        let max_attempts = self.config.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;

            let gateway = Arc::clone(&self.gateway);
            let target = id.clone();
            let lookup = tokio::task::spawn_blocking(move || gateway.fetch_address(&target))
                .await
                .unwrap_or_else(|err| {
                    Err(TransientConnectionError::new(format!(
                        "address lookup task failed: {err}"
                    )))
                });

            match lookup {
                Ok(address) => {
                    tracing::info!(source_id = %id, %address, attempt, "sensor connected");
                    return Ok(Arc::new(MeasurementSource::new(
                        id.clone(),
                        address,
                        Arc::clone(&self.gateway),
                    )));
                }
                Err(err) if attempt < max_attempts => {
                    tracing::warn!(
                        source_id = %id,
                        attempt,
                        max_attempts,
                        %err,
                        "sensor connection attempt failed, retrying"
                    );
                    if !self.config.retry_delay.is_zero() {
                        tokio::time::sleep(self.config.retry_delay).await;
                    }
                }
                Err(err) => {
                    tracing::warn!(source_id = %id, attempts = max_attempts, %err, "giving up on sensor connection");
                    return Err(ConnectionError {
                        source_id: id.clone(),
                        attempts: max_attempts,
                        last_error: err,
                    });
                }
            }
        }
    }
}
