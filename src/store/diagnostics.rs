//! Store Diagnostics
//!
//! Values derived on demand from a [`BoundedStore`] for the status page and
//! metrics. Nothing here is stored separately from the store itself.

use serde::{Deserialize, Serialize};

use super::bounded::BoundedStore;

/// Point-in-time view of store health
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Number of stored entries
    pub entry_count: usize,
    /// Aggregate cost of stored entries
    pub total_size_bytes: u64,
    /// Configured byte budget
    pub budget_bytes: u64,
    /// Entries per millisecond of retained history
    pub throughput_estimate: f64,
}

impl Diagnostics {
    /// Derive diagnostics from the current store contents
    pub fn from_store(store: &BoundedStore) -> Self {
        Self {
            entry_count: store.len(),
            total_size_bytes: store.total_size(),
            budget_bytes: store.budget(),
            throughput_estimate: throughput_estimate(store),
        }
    }

    /// Fraction of the budget in use
    pub fn utilization(&self) -> f64 {
        if self.budget_bytes == 0 {
            0.0
        } else {
            self.total_size_bytes as f64 / self.budget_bytes as f64
        }
    }
}

/// `entry_count / (newest - oldest)`, or 0 when the span is not positive
pub fn throughput_estimate(store: &BoundedStore) -> f64 {
    match (store.newest(), store.oldest()) {
        (Some(newest), Some(oldest)) => {
            let span = newest.timestamp().saturating_sub(oldest.timestamp());
            if span > 0 {
                store.len() as f64 / span as f64
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

// =============================================================================
// Tests
// =============================================================================
