//! Property-Based Tests for the Bounded Store
//!
//! # Test Properties
//!
//! 1. **Size Accounting**: the running counter always equals the recomputed sum
//! 2. **Budget**: the counter stays within budget unless a single oversized entry is held
//! 3. **FIFO Eviction**: survivors are always the most recent suffix of the inserts
//! 4. **Ordering**: desc is reverse insertion order, asc is insertion order
//! 5. **Limit**: a query never returns more than `min(limit, max)` records

#![cfg(test)]

use proptest::prelude::*;

use super::bounded::BoundedStore;
use super::entry::{entry_size, Entry};
use super::query::{query, MessageQuery, Order};

// =============================================================================
// Property Strategies
// =============================================================================

/// Strategy for message texts, including multi-byte characters.
fn text_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z0-9-]{0,40}",
        "\\PC{0,12}",
    ]
}

/// Strategy for insertion sequences.
fn texts_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(text_strategy(), 0..200)
}

/// Strategy for budgets, small enough to force frequent eviction.
fn budget_strategy() -> impl Strategy<Value = u64> {
    0u64..600
}

fn fill(budget: u64, texts: &[String]) -> BoundedStore {
    let mut store = BoundedStore::new(budget);
    for (i, text) in texts.iter().enumerate() {
        store.insert(Entry::new(i as i64, text.as_str()));
    }
    store
}

// =============================================================================
// Store Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: the counter matches the true sum after every insert.
    #[test]
    fn prop_counter_matches_sum(budget in budget_strategy(), texts in texts_strategy()) {
        let mut store = BoundedStore::new(budget);
        for (i, text) in texts.iter().enumerate() {
            store.insert(Entry::new(i as i64, text.as_str()));

            let recomputed: u64 = store.snapshot().newest_first().map(Entry::size).sum();
            prop_assert_eq!(store.total_size(), recomputed);
        }
    }

    /// Property: the budget holds except for a lone oversized entry.
    #[test]
    fn prop_budget_respected(budget in budget_strategy(), texts in texts_strategy()) {
        let mut store = BoundedStore::new(budget);
        for (i, text) in texts.iter().enumerate() {
            store.insert(Entry::new(i as i64, text.as_str()));

            if store.total_size() > budget {
                prop_assert_eq!(store.len(), 1);
                prop_assert!(entry_size(text) > budget);
            }
        }
    }

    /// Property: the store always holds a contiguous run of the newest inserts,
    /// and that run is as long as the budget allows.
    #[test]
    fn prop_fifo_eviction(budget in budget_strategy(), texts in texts_strategy()) {
        let store = fill(budget, &texts);

        let kept: Vec<i64> = store.snapshot().oldest_first().map(Entry::timestamp).collect();
        if texts.is_empty() {
            prop_assert!(kept.is_empty());
        } else {
            let first = texts.len() - kept.len();
            let expected: Vec<i64> = (first as i64..texts.len() as i64).collect();
            prop_assert_eq!(&kept, &expected);

            // The next older entry would not have fit alongside the survivors
            if first > 0 && !kept.is_empty() {
                let older = entry_size(&texts[first - 1]);
                prop_assert!(store.total_size() + older > budget);
            }
        }
    }

    /// Property: unfiltered queries follow insertion order exactly.
    #[test]
    fn prop_recency_order(texts in texts_strategy()) {
        let store = fill(u64::MAX / 2, &texts);
        let n = texts.len();

        let desc: Vec<i64> = query(store.snapshot(), &MessageQuery::new(), usize::MAX)
            .map(Entry::timestamp)
            .collect();
        let expected_desc: Vec<i64> = (0..n as i64).rev().collect();
        prop_assert_eq!(desc, expected_desc);

        let asc_params = MessageQuery::new().order(Order::Asc);
        let asc: Vec<i64> = query(store.snapshot(), &asc_params, usize::MAX)
            .map(Entry::timestamp)
            .collect();
        let expected_asc: Vec<i64> = (0..n as i64).collect();
        prop_assert_eq!(asc, expected_asc);
    }

    /// Property: result count never exceeds the clamped limit, and every result
    /// satisfies every filter.
    #[test]
    fn prop_query_limit_and_filters(
        texts in texts_strategy(),
        limit in 0usize..50,
        max in 1usize..30,
        from in prop::option::of(0i64..200),
        to in prop::option::of(0i64..200),
        prefix in prop::option::of("[a-c]{0,2}"),
    ) {
        let store = fill(u64::MAX / 2, &texts);
        let params = MessageQuery {
            order: Order::Desc,
            timestamp_from: from,
            timestamp_to: to,
            starts_with: prefix,
            limit,
        };

        let results: Vec<&Entry> = query(store.snapshot(), &params, max).collect();
        prop_assert!(results.len() <= limit.max(1).min(max));

        for entry in &results {
            prop_assert!(params.matches(entry));
        }

        let total_matching = store
            .snapshot()
            .newest_first()
            .filter(|e| params.matches(e))
            .count();
        prop_assert_eq!(results.len(), total_matching.min(params.effective_limit(max)));
    }
}
