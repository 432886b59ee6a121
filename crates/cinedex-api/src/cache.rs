//! Time-bounded response cache.
//!
//! Stores raw response bodies keyed by the fully-qualified request URL.
//! Staleness is advisory: two callers may refresh the same key at once and
//! the last write wins. Each insert sweeps out entries older than the
//! cache's retention window.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, TimeDelta, Utc};

/// Default cache lifetime (24 hours).
pub const DEFAULT_CACHE_SECONDS: u64 = 60 * 60 * 24;

/// Source of "now" for staleness checks.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-driven clock for deterministic staleness tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub const fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Moves the clock forward by `seconds`.
    pub fn advance(&self, seconds: i64) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(next) = TimeDelta::try_seconds(seconds).and_then(|d| now.checked_add_signed(d))
        {
            *now = next;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A cached response body and when it was fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Raw response body.
    pub payload: String,
    /// Fetch timestamp.
    pub fetched_at: DateTime<Utc>,
}

/// Storage backend for cached responses.
pub trait CacheStore: Send + Sync + fmt::Debug {
    /// Returns the entry stored under `key`.
    fn get(&self, key: &str) -> Option<CacheEntry>;

    /// Stores `entry` under `key`, replacing any previous entry.
    fn put(&self, key: String, entry: CacheEntry);

    /// Removes every entry fetched before `cutoff` and returns how many went.
    fn evict_older_than(&self, cutoff: DateTime<Utc>) -> usize;

    /// Number of stored entries.
    fn len(&self) -> usize;

    /// Returns `true` if nothing is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-process `HashMap` store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn put(&self, key: String, entry: CacheEntry) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, entry);
    }

    fn evict_older_than(&self, cutoff: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| entry.fetched_at >= cutoff);
        before.saturating_sub(entries.len())
    }

    fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Cache front: pairs a store with a clock and applies the freshness rule.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    retention_seconds: u64,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(SystemClock))
    }
}

impl ResponseCache {
    /// Creates a cache over `store`, timed by `clock`, retaining entries
    /// for [`DEFAULT_CACHE_SECONDS`].
    #[must_use]
    pub fn new(store: Arc<dyn CacheStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            retention_seconds: DEFAULT_CACHE_SECONDS,
        }
    }

    /// Keeps entries for `seconds` before an insert sweeps them out.
    ///
    /// Lookups asking for a longer max age than this miss once the entry
    /// has been swept.
    #[must_use]
    pub fn with_retention(mut self, seconds: u64) -> Self {
        self.retention_seconds = seconds;
        self
    }

    /// Retention window in seconds.
    #[must_use]
    pub const fn retention_seconds(&self) -> u64 {
        self.retention_seconds
    }

    /// Returns the cached body for `key` if it is younger than `max_age_seconds`.
    ///
    /// A `max_age_seconds` of 0 never yields a hit.
    #[must_use]
    pub fn lookup(&self, key: &str, max_age_seconds: u64) -> Option<String> {
        let entry = self.store.get(key)?;
        let age = self.clock.now().signed_duration_since(entry.fetched_at);
        is_fresh(age, max_age_seconds).then_some(entry.payload)
    }

    /// Records `payload` as fetched now, after evicting expired entries.
    pub fn insert(&self, key: impl Into<String>, payload: impl Into<String>) {
        let now = self.clock.now();
        if let Some(cutoff) = i64::try_from(self.retention_seconds)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|retention| now.checked_sub_signed(retention))
        {
            let evicted = self.store.evict_older_than(cutoff);
            if evicted > 0 {
                tracing::debug!(evicted, "evicted expired cache entries");
            }
        }
        self.store.put(
            key.into(),
            CacheEntry {
                payload: payload.into(),
                fetched_at: now,
            },
        );
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

fn is_fresh(age: TimeDelta, max_age_seconds: u64) -> bool {
    if max_age_seconds == 0 {
        return false;
    }
    // Entries stamped in the future (clock moved back) count as brand new.
    if age < TimeDelta::zero() {
        return true;
    }
    i64::try_from(max_age_seconds)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .is_none_or(|max_age| age < max_age)
}
