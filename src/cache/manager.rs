//! Cache Manager Module
//!
//! Read-through cache over a [`KvStore`]: serves fresh entries, falls back to a
//! caller-supplied fetch on miss or expiry, and collapses concurrent fetches for
//! the same key into one.
//!
//! Caching is an optimization only. Store and serialization failures are logged
//! and treated as misses or skipped writes; the only error a caller ever sees
//! is the one returned by its own fetch.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::future::FutureExt;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::cache::inflight::{Claim, InFlightRegistry, ReleaseGuard, UNREGISTERED};
use crate::cache::{CacheEntry, CacheKey, CacheStats, KvStore, Scope, TtlPolicy};
use crate::error::CacheError;

// == Fetch Options ==
/// Per-call knobs for [`CacheManager::get_or_fetch`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// TTL for the stored result, None = the key's TTL class
    pub ttl: Option<Duration>,
    /// Skip the cache read and replace the entry with fresh data
    pub force_refresh: bool,
}

impl FetchOptions {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }
}

// == Cache Manager ==
/// Cache-aside front for a persistent store. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct CacheManager {
    store: Arc<dyn KvStore>,
    inflight: Arc<InFlightRegistry>,
    stats: Arc<Mutex<CacheStats>>,
    ttl_policy: TtlPolicy,
}

impl CacheManager {
    // == Constructor ==
    /// Creates a manager over `store` using `ttl_policy` for default TTLs.
    pub fn new(store: Arc<dyn KvStore>, ttl_policy: TtlPolicy) -> Self {
        Self {
            store,
            inflight: InFlightRegistry::new(),
            stats: Arc::new(Mutex::new(CacheStats::new())),
            ttl_policy,
        }
    }

    /// Default TTL for `key`, taken from its TTL class.
    pub fn ttl_for(&self, key: CacheKey) -> Duration {
        self.ttl_policy.ttl_for(key.ttl_class())
    }

    /// Snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of fetches currently in flight.
    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }

    fn record(&self, update: impl FnOnce(&mut CacheStats)) {
        update(&mut self.stats.lock().unwrap_or_else(PoisonError::into_inner));
    }

    // == Get ==
    /// Returns the cached payload for `key` if present and fresh.
    ///
    /// Absent, stale, unreadable and undecodable entries all read as None.
    pub async fn get<T: DeserializeOwned>(&self, key: CacheKey, scope: Option<&Scope>) -> Option<T> {
        let composite = key.composite(scope);
        let payload = self.read_fresh(&composite).await;

        if payload.is_some() {
            debug!("Cache hit for {}", composite);
            self.record(CacheStats::record_hit);
        } else {
            debug!("Cache miss for {}", composite);
            self.record(CacheStats::record_miss);
        }
        payload
    }

    async fn read_fresh<T: DeserializeOwned>(&self, composite: &str) -> Option<T> {
        match self.load_entry::<T>(composite).await {
            Ok(Some(entry)) => {
                let payload = entry.into_fresh_payload();
                if payload.is_none() {
                    debug!("Entry {} is stale", composite);
                }
                payload
            }
            Ok(None) => None,
            Err(err) => {
                warn!("Treating unreadable entry {} as a miss: {}", composite, err);
                self.record(CacheStats::record_store_error);
                None
            }
        }
    }

    async fn load_entry<T: DeserializeOwned>(
        &self,
        composite: &str,
    ) -> Result<Option<CacheEntry<T>>, CacheError> {
        match self.store.read(composite).await? {
            Some(blob) => Ok(Some(serde_json::from_str(&blob)?)),
            None => Ok(None),
        }
    }

    // == Set ==
    /// Stores `payload` under `key`, stamped with the current time.
    ///
    /// `ttl` of None uses the key's TTL class. Write failures are logged only.
    pub async fn set<T: Serialize>(
        &self,
        key: CacheKey,
        payload: &T,
        scope: Option<&Scope>,
        ttl: Option<Duration>,
    ) {
        let ttl = ttl.unwrap_or_else(|| self.ttl_for(key));
        self.write_entry(&key.composite(scope), payload, ttl).await;
    }

    async fn write_entry<T: Serialize>(&self, composite: &str, payload: &T, ttl: Duration) {
        if let Err(err) = self.store_entry(composite, payload, ttl).await {
            warn!("Failed to cache {}: {}", composite, err);
            self.record(CacheStats::record_store_error);
        }
    }

    async fn store_entry<T: Serialize>(
        &self,
        composite: &str,
        payload: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let blob = serde_json::to_string(&CacheEntry::new(payload, ttl))?;
        self.store.write(composite, blob).await?;
        Ok(())
    }

    // == Invalidate ==
    /// Removes the entry for `key`. Removing an absent entry is a no-op.
    pub async fn invalidate(&self, key: CacheKey, scope: Option<&Scope>) {
        let composite = key.composite(scope);
        match self.store.remove(&composite).await {
            Ok(()) => {
                debug!("Invalidated {}", composite);
                self.record(|stats| stats.record_invalidations(1));
            }
            Err(err) => {
                warn!("Failed to invalidate {}: {}", composite, err);
                self.record(CacheStats::record_store_error);
            }
        }
    }

    // == Invalidate Scope ==
    /// Removes every entry stored under `scope`, e.g. on sign-out.
    ///
    /// Best effort: enumeration or removal failures are logged and skipped.
    /// Returns the number of entries removed.
    pub async fn invalidate_scope(&self, scope: &Scope) -> usize {
        let keys = match self.store.list_keys().await {
            Ok(keys) => keys,
            Err(err) => {
                warn!("Failed to list cache keys for scope {}: {}", scope, err);
                self.record(CacheStats::record_store_error);
                return 0;
            }
        };

        let mut removed = 0;
        for key in keys.iter().filter(|key| scope.matches(key)) {
            match self.store.remove(key).await {
                Ok(()) => removed += 1,
                Err(err) => {
                    warn!("Failed to remove {} during scope sweep: {}", key, err);
                    self.record(CacheStats::record_store_error);
                }
            }
        }

        self.record(|stats| stats.record_invalidations(removed as u64));
        info!("Invalidated {} cached entries for scope {}", removed, scope);
        removed
    }

    // == Get Or Fetch ==
    /// Returns the cached payload for `key`, or fetches, caches and returns it.
    ///
    /// Concurrent calls for the same composite key share a single invocation of
    /// `fetch`; every caller receives its result or its error. The fetch runs to
    /// completion (and its result is cached) even if all callers stop waiting.
    /// Failures are never cached, and the key is freed for the next attempt as
    /// soon as the fetch settles. There is no retry.
    pub async fn get_or_fetch<T, E, F, Fut>(
        &self,
        key: CacheKey,
        scope: Option<&Scope>,
        options: FetchOptions,
        fetch: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        if options.force_refresh {
            self.invalidate(key, scope).await;
        } else if let Some(payload) = self.get(key, scope).await {
            return Ok(payload);
        }

        let composite = key.composite(scope);
        let ttl = options.ttl.unwrap_or_else(|| self.ttl_for(key));

        let manager = self.clone();
        let fetch_key = composite.clone();
        let make = move |generation: u64| {
            let guard = ReleaseGuard::new(&manager.inflight, fetch_key.clone(), generation);
            async move {
                let result = fetch().await;
                match &result {
                    Ok(payload) => manager.write_entry(&fetch_key, payload, ttl).await,
                    Err(_) => {
                        debug!("Fetch for {} failed; nothing cached", fetch_key);
                        manager.record(CacheStats::record_fetch_failure);
                    }
                }
                // Deregister only after the write so late callers hit the cache.
                drop(guard);
                result
            }
            .boxed()
        };

        match self.inflight.claim::<T, E, _>(&composite, make) {
            Claim::Registered(shared) => {
                debug!("Fetching {} from origin", composite);
                self.record(CacheStats::record_fetch);
                // Detached driver: the fetch completes even if every caller goes away.
                if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                    let _ = runtime.spawn(shared.clone());
                }
                shared.await
            }
            Claim::Attached(shared) => {
                debug!("Joining in-flight fetch for {}", composite);
                self.record(CacheStats::record_coalesced);
                shared.await
            }
            Claim::Conflict(make) => {
                warn!(
                    "In-flight fetch for {} has another payload type; fetching separately",
                    composite
                );
                self.record(CacheStats::record_fetch);
                make(UNREGISTERED).await
            }
        }
    }
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("ttl_policy", &self.ttl_policy)
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}
