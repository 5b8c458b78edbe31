//! Broadcast Service
//!
//! The single owned instance of the message store, shared by every request
//! handler. A `parking_lot::RwLock` serialises writers against each other and
//! against the snapshot step of readers, so no caller can observe a store
//! mid-eviction.
//!
//! Queries copy the matching entries out under the read lock (message text is
//! reference-counted, so this is cheap) and release the lock before anything is
//! written to the network.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};
use crate::config::TowerConfig;
use crate::metrics::TowerMetrics;
use crate::store::{self, BoundedStore, Diagnostics, Entry, MessageQuery};

/// Shared handle to the message store
pub struct BroadcastService {
    store: RwLock<BoundedStore>,
    config: TowerConfig,
    clock: Arc<dyn Clock>,
    metrics: TowerMetrics,
}

impl BroadcastService {
    /// Create a service with the system clock
    pub fn new(config: TowerConfig, budget_bytes: u64, metrics: TowerMetrics) -> Self {
        Self::with_clock(config, budget_bytes, metrics, Arc::new(SystemClock))
    }

    /// Create a service with a custom clock
    pub fn with_clock(
        config: TowerConfig,
        budget_bytes: u64,
        metrics: TowerMetrics,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let service = Self {
            store: RwLock::new(BoundedStore::new(budget_bytes)),
            config,
            clock,
            metrics,
        };
        service.metrics.observe_store(&service.diagnostics());
        service
    }

    /// Stamp and store a message.
    ///
    /// The text must already be validated against the configured message size.
    pub fn broadcast(&self, text: impl Into<Arc<str>>) -> Entry {
        let entry = Entry::new(self.clock.now_millis(), text);

        let (evicted, diagnostics) = {
            let mut store = self.store.write();
            let evicted = store.insert(entry.clone());
            (evicted, Diagnostics::from_store(&store))
        };

        if evicted > 0 {
            debug!(
                "Evicted {} entries to admit {} bytes ({} / {} bytes used)",
                evicted,
                entry.size(),
                diagnostics.total_size_bytes,
                diagnostics.budget_bytes
            );
        }
        if entry.size() > diagnostics.budget_bytes {
            debug!(
                "Entry of {} bytes exceeds the {} byte budget and is stored alone",
                entry.size(),
                diagnostics.budget_bytes
            );
        }

        self.metrics.record_broadcast(evicted);
        self.metrics.observe_store(&diagnostics);
        entry
    }

    /// Run a query and return the matching entries in result order
    pub fn query(&self, params: &MessageQuery) -> Vec<Entry> {
        let results: Vec<Entry> = {
            let store = self.store.read();
            store::query(store.snapshot(), params, self.config.max_messages_per_query)
                .cloned()
                .collect()
        };

        trace!(
            "Query order={} from={:?} to={:?} prefix={:?} returned {} entries",
            params.order,
            params.timestamp_from,
            params.timestamp_to,
            params.starts_with,
            results.len()
        );
        self.metrics.record_query(params.order);
        results
    }

    /// Current store diagnostics
    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics::from_store(&self.store.read())
    }

    pub fn config(&self) -> &TowerConfig {
        &self.config
    }

    pub fn metrics(&self) -> &TowerMetrics {
        &self.metrics
    }
}

impl std::fmt::Debug for BroadcastService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastService")
            .field("config", &self.config)
            .field("diagnostics", &self.diagnostics())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
