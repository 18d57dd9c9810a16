//! In-memory resolution cache with in-flight deduplication
//!
//! Results are memoized per [`CacheKey`] until the TTL elapses or the entry
//! is evicted for being the least recently accessed. Concurrent lookups of a
//! key that is still being resolved join the outstanding resolution instead
//! of starting another one. Failures are never stored.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::version::error::LookupError;
use crate::version::types::{Ecosystem, ResolutionResult};

type Outcome = Result<ResolutionResult, LookupError>;
type InFlight = Shared<BoxFuture<'static, Outcome>>;

/// Identity of a resolution for caching and deduplication
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub ecosystem: Ecosystem,
    /// Normalized package identifier
    pub package: String,
    /// Trimmed hint, `None` when blank
    pub hint: Option<String>,
    pub include_extra: bool,
}

impl CacheKey {
    pub fn new(
        ecosystem: Ecosystem,
        package: impl Into<String>,
        hint: Option<&str>,
        include_extra: bool,
    ) -> Self {
        Self {
            ecosystem,
            package: package.into(),
            hint: hint
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(str::to_string),
            include_extra,
        }
    }
}

struct CacheEntry {
    result: ResolutionResult,
    inserted_at: Instant,
    /// Access sequence number of the latest insert or hit
    last_access: u64,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    in_flight: HashMap<CacheKey, InFlight>,
    access_seq: u64,
}

impl CacheState {
    fn next_access(&mut self) -> u64 {
        self.access_seq += 1;
        self.access_seq
    }
}

struct Inner {
    state: Mutex<CacheState>,
    ttl: Duration,
    max_entries: usize,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // Resolvers run outside the lock, so a poisoned state is still consistent
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_expired(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.duration_since(entry.inserted_at) >= self.ttl
    }

    /// Store a successful outcome and close the in-flight group in one step
    fn complete(&self, key: &CacheKey, outcome: &Outcome) {
        let mut state = self.lock();

        if let Ok(result) = outcome {
            let last_access = state.next_access();
            state.entries.insert(
                key.clone(),
                CacheEntry {
                    result: result.clone(),
                    inserted_at: Instant::now(),
                    last_access,
                },
            );
            self.purge_and_evict(&mut state);
        }

        state.in_flight.remove(key);
    }

    fn purge_and_evict(&self, state: &mut CacheState) {
        let now = Instant::now();
        let before = state.entries.len();
        state
            .entries
            .retain(|_, entry| now.duration_since(entry.inserted_at) < self.ttl);
        if state.entries.len() < before {
            debug!("Purged {} expired cache entries", before - state.entries.len());
        }

        while state.entries.len() > self.max_entries {
            let Some(oldest) = state
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(key, _)| key.clone())
            else {
                break;
            };
            debug!(
                "Evicting cache entry {} {}",
                oldest.ecosystem, oldest.package
            );
            state.entries.remove(&oldest);
        }
    }
}

/// Shared resolution cache
///
/// Cloning is cheap and every clone sees the same entries.
#[derive(Clone)]
pub struct ResolutionCache {
    inner: Arc<Inner>,
}

impl ResolutionCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(CacheState::default()),
                ttl,
                max_entries,
            }),
        }
    }

    /// Return the cached result for `key`, or resolve it once
    ///
    /// The resolver runs as its own task. Dropping the returned future only
    /// abandons this caller's wait; the resolution still completes and
    /// populates the cache for later callers.
    pub async fn get_or_resolve<F, Fut>(
        &self,
        key: CacheKey,
        resolver: F,
    ) -> Result<ResolutionResult, LookupError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<ResolutionResult, LookupError>> + Send + 'static,
    {
        let pending = {
            let mut state = self.inner.lock();
            let now = Instant::now();

            let expired = state
                .entries
                .get(&key)
                .is_some_and(|entry| self.inner.is_expired(entry, now));
            if expired {
                state.entries.remove(&key);
            }

            if state.entries.contains_key(&key) {
                let access = state.next_access();
                if let Some(entry) = state.entries.get_mut(&key) {
                    entry.last_access = access;
                    debug!("Cache hit for {} {}", key.ecosystem, key.package);
                    return Ok(entry.result.clone());
                }
            }

            match state.in_flight.get(&key) {
                Some(pending) => {
                    debug!("Joining in-flight lookup for {} {}", key.ecosystem, key.package);
                    pending.clone()
                }
                None => {
                    debug!("Cache miss for {} {}", key.ecosystem, key.package);
                    let pending = self.spawn_resolver(key.clone(), resolver);
                    state.in_flight.insert(key, pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    fn spawn_resolver<F, Fut>(&self, key: CacheKey, resolver: F) -> InFlight
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            let outcome = AssertUnwindSafe(async move { resolver().await })
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    warn!("Resolver for {} {} panicked", key.ecosystem, key.package);
                    Err(LookupError::UpstreamUnavailable(
                        "resolver panicked".to_string(),
                    ))
                });

            inner.complete(&key, &outcome);
            outcome
        });

        handle
            .map(|joined| {
                joined.unwrap_or_else(|e| {
                    Err(LookupError::UpstreamUnavailable(format!(
                        "resolver task failed: {}",
                        e
                    )))
                })
            })
            .boxed()
            .shared()
    }

    /// Whether a live entry exists for `key`, without touching its recency
    pub fn contains(&self, key: &CacheKey) -> bool {
        let state = self.inner.lock();
        let now = Instant::now();
        state
            .entries
            .get(key)
            .is_some_and(|entry| !self.inner.is_expired(entry, now))
    }

    /// Number of stored entries, expired ones included until purged
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
