//! Prometheus Metrics
//!
//! Counters and gauges for the message store, exported in the Prometheus text
//! format on the health listener's `/metrics` route.
//!
//! Each [`TowerMetrics`] owns its own [`Registry`], so independent service
//! instances (tests included) never collide on metric names.

use prometheus::core::Collector;
use prometheus::{Encoder, Gauge, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::error::{Error, Result};
use crate::store::{Diagnostics, Order};

const NAMESPACE: &str = "broadcast_tower";

/// Store and request metrics
#[derive(Clone)]
pub struct TowerMetrics {
    registry: Registry,
    broadcasts: IntCounter,
    evictions: IntCounter,
    queries: IntCounterVec,
    rejected: IntCounterVec,
    entries: IntGauge,
    stored_bytes: IntGauge,
    budget_bytes: IntGauge,
    utilization: Gauge,
}

impl TowerMetrics {
    /// Create and register all metrics
    pub fn new() -> Result<Self> {
        let broadcasts = IntCounter::with_opts(opts("broadcasts_total", "Messages accepted"))
            .map_err(metric_error)?;
        let evictions = IntCounter::with_opts(opts("evictions_total", "Messages evicted"))
            .map_err(metric_error)?;
        let queries = IntCounterVec::new(opts("queries_total", "Queries served"), &["order"])
            .map_err(metric_error)?;
        let rejected = IntCounterVec::new(
            opts("rejected_requests_total", "Requests failing validation"),
            &["route"],
        )
        .map_err(metric_error)?;
        let entries = IntGauge::with_opts(opts("entries", "Messages currently stored"))
            .map_err(metric_error)?;
        let stored_bytes = IntGauge::with_opts(opts("stored_bytes", "Cost of stored messages"))
            .map_err(metric_error)?;
        let budget_bytes = IntGauge::with_opts(opts("budget_bytes", "Store budget"))
            .map_err(metric_error)?;
        let utilization = Gauge::with_opts(opts("budget_utilization", "Budget fraction in use"))
            .map_err(metric_error)?;

        let collectors: Vec<Box<dyn Collector>> = vec![
            Box::new(broadcasts.clone()),
            Box::new(evictions.clone()),
            Box::new(queries.clone()),
            Box::new(rejected.clone()),
            Box::new(entries.clone()),
            Box::new(stored_bytes.clone()),
            Box::new(budget_bytes.clone()),
            Box::new(utilization.clone()),
        ];
        let registry = Registry::new();
        for collector in collectors {
            registry.register(collector).map_err(metric_error)?;
        }

        Ok(Self {
            registry,
            broadcasts,
            evictions,
            queries,
            rejected,
            entries,
            stored_bytes,
            budget_bytes,
            utilization,
        })
    }

    /// Record an accepted broadcast and the evictions it caused
    pub fn record_broadcast(&self, evicted: usize) {
        self.broadcasts.inc();
        self.evictions.inc_by(evicted as u64);
    }

    /// Record a served query
    pub fn record_query(&self, order: Order) {
        self.queries.with_label_values(&[order.as_str()]).inc();
    }

    /// Record a request rejected by validation
    pub fn record_rejection(&self, route: &str) {
        self.rejected.with_label_values(&[route]).inc();
    }

    /// Refresh store gauges
    pub fn observe_store(&self, diagnostics: &Diagnostics) {
        set_saturating(&self.entries, diagnostics.entry_count as u64);
        set_saturating(&self.stored_bytes, diagnostics.total_size_bytes);
        set_saturating(&self.budget_bytes, diagnostics.budget_bytes);
        self.utilization.set(diagnostics.utilization());
    }

    pub fn utilization(&self) -> f64 {
        self.utilization.get()
    }

    pub fn broadcasts(&self) -> u64 {
        self.broadcasts.get()
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.get()
    }

    pub fn queries(&self, order: Order) -> u64 {
        self.queries.with_label_values(&[order.as_str()]).get()
    }

    pub fn rejections(&self, route: &str) -> u64 {
        self.rejected.with_label_values(&[route]).get()
    }

    /// Encode all metrics in the Prometheus text format
    pub fn encode(&self) -> Result<(Vec<u8>, String)> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(metric_error)?;
        Ok((buffer, encoder.format_type().to_string()))
    }
}

impl std::fmt::Debug for TowerMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TowerMetrics")
            .field("broadcasts", &self.broadcasts())
            .field("evictions", &self.evictions())
            .finish()
    }
}

fn opts(name: &str, help: &str) -> Opts {
    Opts::new(name, help).namespace(NAMESPACE)
}

fn metric_error(e: prometheus::Error) -> Error {
    Error::Internal(format!("metrics: {}", e))
}

fn set_saturating(gauge: &IntGauge, value: u64) {
    gauge.set(i64::try_from(value).unwrap_or(i64::MAX));
}

// =============================================================================
// Tests
// =============================================================================
