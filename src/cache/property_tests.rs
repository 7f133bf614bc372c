//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check freshness, scope isolation and read-through behavior
//! over generated keys, scopes and payloads.

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

use crate::cache::{
    CacheEntry, CacheKey, CacheManager, FetchOptions, KvStore, MemoryStore, Scope, TtlPolicy,
};

// == Test Configuration ==
const TEST_CASES: u32 = 64;

// == Strategies ==
/// Generates scopes without underscores, like user ids
fn scope_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,12}".prop_map(|s| s)
}

fn payload_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-zA-Z0-9 ]{0,16}", 0..8)
}

fn cache_key_strategy() -> impl Strategy<Value = CacheKey> {
    prop::sample::select(CacheKey::ALL.to_vec())
}

fn create_test_manager() -> (CacheManager, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let manager = CacheManager::new(store.clone(), TtlPolicy::default());
    (manager, store)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(TEST_CASES))]

    // An entry is fresh exactly while its age is below its TTL.
    #[test]
    fn prop_entry_validity_matches_age(
        stored_at in 0u64..1_000_000,
        ttl_ms in 0u64..1_000_000,
        now in 0u64..2_000_000,
    ) {
        let entry = CacheEntry { payload: (), stored_at, ttl_ms };
        let expected = now.saturating_sub(stored_at) < ttl_ms;
        prop_assert_eq!(entry.is_valid_at(now), expected);
    }

    // Entries under the same key but different scopes never overwrite each other.
    #[test]
    fn prop_scope_isolation(
        key in cache_key_strategy(),
        scope_a in scope_strategy(),
        scope_b in scope_strategy(),
        payload_a in payload_strategy(),
        payload_b in payload_strategy(),
    ) {
        prop_assume!(scope_a != scope_b);
        let (manager, _store) = create_test_manager();
        let scope_a = Scope::new(scope_a);
        let scope_b = Scope::new(scope_b);

        let (got_a, got_b) = tokio_test::block_on(async {
            manager.set(key, &payload_a, Some(&scope_a), None).await;
            manager.set(key, &payload_b, Some(&scope_b), None).await;
            (
                manager.get::<Vec<String>>(key, Some(&scope_a)).await,
                manager.get::<Vec<String>>(key, Some(&scope_b)).await,
            )
        });

        prop_assert_eq!(got_a, Some(payload_a));
        prop_assert_eq!(got_b, Some(payload_b));
    }

    // A scope sweep removes exactly the entries stored under that scope.
    #[test]
    fn prop_scope_sweep_is_exact(
        entries in prop::collection::vec((cache_key_strategy(), scope_strategy()), 1..20),
        target in scope_strategy(),
    ) {
        let (manager, store) = create_test_manager();
        let target = Scope::new(target);

        let remaining = tokio_test::block_on(async {
            for (key, scope) in &entries {
                manager.set(*key, &1u8, Some(&Scope::new(scope.as_str())), None).await;
            }
            manager.invalidate_scope(&target).await;
            store.list_keys().await.unwrap()
        });

        let expected: HashSet<String> = entries
            .iter()
            .filter(|(_, scope)| scope.as_str() != target.as_str())
            .map(|(key, scope)| key.composite(Some(&Scope::new(scope.as_str()))))
            .collect();
        let remaining: HashSet<String> = remaining.into_iter().collect();
        prop_assert_eq!(remaining, expected);
    }

    // Once a value is cached, later fetches are never consulted until invalidation.
    #[test]
    fn prop_read_through_keeps_first_value(
        values in prop::collection::vec(payload_strategy(), 2..6),
        scope in scope_strategy(),
    ) {
        let (manager, _store) = create_test_manager();
        let scope = Scope::new(scope);

        let results = tokio_test::block_on(async {
            let mut results = Vec::new();
            for value in values.clone() {
                let result = manager
                    .get_or_fetch(CacheKey::Rooms, Some(&scope), FetchOptions::default(), move || async move {
                        Ok::<_, String>(value)
                    })
                    .await;
                results.push(result);
            }
            results
        });

        for result in results {
            prop_assert_eq!(result, Ok(values[0].clone()));
        }
        prop_assert_eq!(manager.stats().fetches, 1);
    }
}
