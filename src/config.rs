//! Service Configuration
//!
//! Limits applied to requests and the store, plus derivation of the effective
//! store budget from the configured cap and the detected memory ceiling.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default maximum message size (10kB)
pub const DEFAULT_MAX_MESSAGE_SIZE_BYTES: usize = 10_000;

/// Default maximum number of records per query
pub const DEFAULT_MAX_MESSAGES_PER_QUERY: usize = 1_000;

/// Default store cap (1GB)
pub const DEFAULT_MAX_CACHE_SIZE_BYTES: u64 = 1_000 * 1_000 * 1_000;

/// Share of the memory ceiling the store may use
pub const MEMORY_BUDGET_RATIO: f64 = 0.8;

/// Limits for the message store and its request validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TowerConfig {
    /// Largest accepted message, in UTF-8 bytes
    pub max_message_size_bytes: usize,
    /// Largest number of records a single query may return
    pub max_messages_per_query: usize,
    /// Configured store cap before the memory ceiling is applied
    pub max_cache_size_bytes: u64,
}

impl Default for TowerConfig {
    fn default() -> Self {
        Self {
            max_message_size_bytes: DEFAULT_MAX_MESSAGE_SIZE_BYTES,
            max_messages_per_query: DEFAULT_MAX_MESSAGES_PER_QUERY,
            max_cache_size_bytes: DEFAULT_MAX_CACHE_SIZE_BYTES,
        }
    }
}

impl TowerConfig {
    /// Reject zero limits
    pub fn validate(&self) -> Result<()> {
        if self.max_message_size_bytes == 0 {
            return Err(Error::Config(
                "max message size must be a positive integer".to_string(),
            ));
        }
        if self.max_messages_per_query == 0 {
            return Err(Error::Config(
                "max messages per query must be a positive integer".to_string(),
            ));
        }
        if self.max_cache_size_bytes == 0 {
            return Err(Error::Config(
                "max cache size must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }

    /// Store budget: the configured cap, further limited to
    /// [`MEMORY_BUDGET_RATIO`] of the memory ceiling when one is known.
    pub fn effective_budget(&self, memory_limit_bytes: Option<u64>) -> u64 {
        match memory_limit_bytes {
            Some(limit) => {
                let share = (limit as f64 * MEMORY_BUDGET_RATIO) as u64;
                self.max_cache_size_bytes.min(share)
            }
            None => self.max_cache_size_bytes,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
