//! In-Flight Registry Module
//!
//! Tracks the single outstanding fetch per composite key so concurrent
//! callers share one upstream request.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures::future::{BoxFuture, FutureExt, Shared};

/// A fetch whose result can be awaited by any number of callers.
pub type SharedFetch<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;

/// Generation handed to fetches that were never registered.
pub const UNREGISTERED: u64 = 0;

struct Slot {
    generation: u64,
    /// Always a `SharedFetch<T, E>` for the `T`, `E` of the registering caller
    fetch: Box<dyn Any + Send + Sync>,
}

#[derive(Default)]
struct Slots {
    by_key: HashMap<String, Slot>,
    last_generation: u64,
}

// == Claim ==
/// Outcome of trying to register a fetch for a key.
pub enum Claim<T, E, M> {
    /// No fetch was running; the caller's fetch is now registered
    Registered(SharedFetch<T, E>),
    /// A fetch was already running; await it instead
    Attached(SharedFetch<T, E>),
    /// The running fetch produces a different payload type; `M` was not used
    Conflict(M),
}

// == In-Flight Registry ==
/// Map of composite key to the fetch currently satisfying it.
///
/// Check-and-register happens under a single lock acquisition, so at most one
/// fetch is registered per key even when callers run on parallel threads.
#[derive(Default)]
pub struct InFlightRegistry {
    slots: Mutex<Slots>,
}

impl InFlightRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        // Slots hold no invariant a panicking holder could break halfway.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // == Claim ==
    /// Attaches to the fetch registered for `key`, or registers a new one.
    ///
    /// `make` receives the generation of the new registration and must build a
    /// future that settles the fetch and then calls [`release`](Self::release)
    /// (see [`ReleaseGuard`]). It is only invoked when nothing is registered.
    pub fn claim<T, E, M>(&self, key: &str, make: M) -> Claim<T, E, M>
    where
        T: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
        M: FnOnce(u64) -> BoxFuture<'static, Result<T, E>>,
    {
        let mut slots = self.lock();

        if let Some(slot) = slots.by_key.get(key) {
            return match slot.fetch.downcast_ref::<SharedFetch<T, E>>() {
                Some(shared) => Claim::Attached(shared.clone()),
                None => Claim::Conflict(make),
            };
        }

        slots.last_generation += 1;
        let generation = slots.last_generation;
        let shared = make(generation).shared();
        slots.by_key.insert(
            key.to_string(),
            Slot {
                generation,
                fetch: Box::new(shared.clone()),
            },
        );
        Claim::Registered(shared)
    }

    // == Release ==
    /// Deregisters `key` if it is still held by `generation`.
    ///
    /// Returns true if a registration was removed.
    pub fn release(&self, key: &str, generation: u64) -> bool {
        let removed = {
            let mut slots = self.lock();
            match slots.by_key.get(key) {
                Some(slot) if slot.generation == generation => slots.by_key.remove(key),
                _ => None,
            }
        };
        // Dropped outside the lock: it may hold the last handle to the fetch.
        removed.is_some()
    }

    /// True if a fetch is registered for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.lock().by_key.contains_key(key)
    }

    /// Number of fetches currently registered.
    pub fn len(&self) -> usize {
        self.lock().by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// == Release Guard ==
/// Releases a registration when dropped.
///
/// Lives inside the registered fetch future, so the key is freed once the fetch
/// settles, panics, or is dropped, no matter which caller was driving it.
pub struct ReleaseGuard {
    registry: Weak<InFlightRegistry>,
    key: String,
    generation: u64,
}

impl ReleaseGuard {
    pub fn new(registry: &Arc<InFlightRegistry>, key: impl Into<String>, generation: u64) -> Self {
        Self {
            registry: Arc::downgrade(registry),
            key: key.into(),
            generation,
        }
    }
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        if self.generation == UNREGISTERED {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.release(&self.key, self.generation);
        }
    }
}
