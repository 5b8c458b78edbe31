//! Bounded Message Store
//!
//! Ephemeral, byte-budgeted message log with a read-only query engine.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │                           Message Store                                  │
//! ├──────────────────────────────────────────────────────────────────────────┤
//! │  write ─▶ Entry ─▶ entry_size ─▶ BoundedStore::insert                    │
//! │                                   │  (evict oldest until it fits)        │
//! │                                   ▼                                      │
//! │                    VecDeque<Entry>  newest ◀──────────▶ oldest           │
//! │                                   │                                      │
//! │                                   ▼                                      │
//! │  read  ◀─ "ts|text" ◀─ query(Snapshot, MessageQuery)                     │
//! │                        (order ▸ from ▸ to ▸ prefix ▸ limit)              │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The store is a plain single-owner structure; callers that share it across
//! threads wrap it in a lock (see [`crate::service::BroadcastService`]).

mod bounded;
mod diagnostics;
mod entry;
mod proptest;
mod query;

pub use bounded::{BoundedStore, Snapshot};
pub use diagnostics::{throughput_estimate, Diagnostics};
pub use entry::{entry_size, Entry, OVERHEAD_BYTES};
pub use query::{query, MessageQuery, Order};
