//! Broadcast Tower - Ephemeral Message Log
//!
//! An in-memory, byte-bounded message log served over HTTP. Clients broadcast
//! short text messages, which are stamped with a millisecond timestamp and kept
//! newest-first until the byte budget forces the oldest ones out. Queries filter
//! by time range and prefix and stream results newest-first or oldest-first.
//!
//! # Architecture
//!
//! ```text
//! HTTP (api) → BroadcastService → BoundedStore
//!                    │
//!                    └→ TowerMetrics (health listener: /metrics)
//! ```
//!
//! # Modules
//!
//! - [`api`] - Routers, request validation and the accept loop
//! - [`clock`] - Timestamp source
//! - [`config`] - Runtime limits and budget derivation
//! - [`error`] - Error types
//! - [`health`] - Liveness and readiness flags
//! - [`memory`] - Container/host memory limit probing
//! - [`metrics`] - Prometheus metrics
//! - [`service`] - Shared, locked store handle
//! - [`store`] - Bounded store, queries and diagnostics

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod health;
pub mod memory;
pub mod metrics;
pub mod service;
pub mod store;

/// Crate version, shown on the status page and in health reports
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export commonly used types
pub use config::TowerConfig;
pub use error::{Error, Result, ValidationError};
pub use service::BroadcastService;
pub use store::{BoundedStore, Entry, MessageQuery, Order};
