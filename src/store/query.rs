//! Query Engine
//!
//! Read-only filter/order/limit over a [`Snapshot`]. Filters combine with AND
//! semantics and are applied in a single lazy pass, so results can be streamed
//! one record at a time.

use std::fmt;
use std::str::FromStr;

use super::bounded::Snapshot;
use super::entry::Entry;

/// Result ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Order {
    /// Oldest first
    Asc,
    /// Newest first
    #[default]
    Desc,
}

impl Order {
    /// Label used on the wire and in metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Order {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Order::Asc),
            "desc" => Ok(Order::Desc),
            other => Err(format!("expected 'asc' or 'desc', got '{}'", other)),
        }
    }
}

/// Typed, already-validated query parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageQuery {
    /// Result ordering
    pub order: Order,
    /// Inclusive lower timestamp bound
    pub timestamp_from: Option<i64>,
    /// Inclusive upper timestamp bound
    pub timestamp_to: Option<i64>,
    /// Case-sensitive text prefix
    pub starts_with: Option<String>,
    /// Requested result count, clamped by the engine
    pub limit: usize,
}

impl Default for MessageQuery {
    fn default() -> Self {
        Self {
            order: Order::Desc,
            timestamp_from: None,
            timestamp_to: None,
            starts_with: None,
            limit: usize::MAX,
        }
    }
}

impl MessageQuery {
    /// Query with every filter unset
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    pub fn since(mut self, timestamp: i64) -> Self {
        self.timestamp_from = Some(timestamp);
        self
    }

    pub fn until(mut self, timestamp: i64) -> Self {
        self.timestamp_to = Some(timestamp);
        self
    }

    pub fn starts_with(mut self, prefix: impl Into<String>) -> Self {
        self.starts_with = Some(prefix.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Limit clamped to `[1, max_results]`
    pub fn effective_limit(&self, max_results: usize) -> usize {
        self.limit.clamp(1, max_results.max(1))
    }

    /// Whether an entry passes every active filter
    pub fn matches(&self, entry: &Entry) -> bool {
        if let Some(from) = self.timestamp_from {
            if entry.timestamp() < from {
                return false;
            }
        }
        if let Some(to) = self.timestamp_to {
            if entry.timestamp() > to {
                return false;
            }
        }
        match &self.starts_with {
            Some(prefix) => entry.text().starts_with(prefix.as_str()),
            None => true,
        }
    }
}

/// Run a query against a snapshot.
///
/// The returned iterator is lazy; nothing is materialised until it is driven.
/// Yielded entries borrow from the snapshot only, so they outlive `params`.
pub fn query<'s, 'p>(
    snapshot: Snapshot<'s>,
    params: &'p MessageQuery,
    max_results: usize,
) -> impl Iterator<Item = &'s Entry> + 'p
where
    's: 'p,
{
    let ordered: Box<dyn Iterator<Item = &'s Entry> + 's> = match params.order {
        Order::Desc => Box::new(snapshot.newest_first()),
        Order::Asc => Box::new(snapshot.oldest_first()),
    };

    ordered
        .filter(move |entry| params.matches(entry))
        .take(params.effective_limit(max_results))
}

// =============================================================================
// Tests
// =============================================================================
