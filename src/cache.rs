//! Bounded, time-limited result cache.
//!
//! Entries are evicted by whichever comes first:
//!
//! - **Capacity**: least recently used entry goes when a new key would overflow it
//! - **TTL**: every entry carries an expiry timestamp set on write; expired
//!   entries are dropped lazily on read, or eagerly by [`ResultCache::sweep`]
//!
//! All state sits behind one mutex, so a cache can be shared across threads.
//!
//! # Example
//!
//! ```rust,ignore
//! use musical_oklab::cache::ResultCache;
//! use std::time::Duration;
//!
//! let cache = ResultCache::new(2, Duration::from_secs(300));
//! cache.insert(1.into(), "a");
//! cache.insert(2.into(), "b");
//! cache.insert(3.into(), "c");
//! assert_eq!(cache.len(), 2); // Bounded
//! assert_eq!(cache.get(1.into()), None); // Oldest evicted
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::music::MusicAnalysisData;

/// Default number of cached results.
pub const DEFAULT_CAPACITY: usize = 20;

/// Default lifetime of a cached result.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Source of the current time.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// Start at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self { now: Mutex::new(Instant::now()) }
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Composite key of a processing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey(u64);

impl CacheKey {
    /// Hash of track id, timestamp and the serialized music data.
    pub fn for_request(track_id: &str, timestamp: u64, music: &MusicAnalysisData) -> Result<Self> {
        let serialized = serde_json::to_string(music)?;
        let mut hasher = DefaultHasher::new();
        track_id.hash(&mut hasher);
        timestamp.hash(&mut hasher);
        serialized.hash(&mut hasher);
        Ok(Self(hasher.finish()))
    }

    /// Raw hash value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for CacheKey {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    /// `None` when the TTL reaches past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Debug)]
struct State<V> {
    entries: HashMap<CacheKey, Entry<V>>,
    /// Recency order, least recently used at the front.
    order: VecDeque<CacheKey>,
}

impl<V> State<V> {
    fn remove(&mut self, key: CacheKey) -> Option<Entry<V>> {
        if let Some(pos) = self.order.iter().position(|k| *k == key) {
            self.order.remove(pos);
        }
        self.entries.remove(&key)
    }

    fn touch(&mut self, key: CacheKey) {
        if let Some(pos) = self.order.iter().position(|k| *k == key) {
            self.order.remove(pos);
        }
        self.order.push_back(key);
    }
}

/// LRU + TTL cache of cloneable values.
pub struct ResultCache<V> {
    state: Mutex<State<V>>,
    capacity: usize,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V> fmt::Debug for ResultCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl<V: Clone> Default for ResultCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}

impl<V: Clone> ResultCache<V> {
    /// Create a cache using the system clock.
    ///
    /// # Panics
    ///
    /// Panics if capacity is 0.
    #[must_use]
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self::with_clock(capacity, ttl, Arc::new(SystemClock))
    }

    /// Create a cache driven by a specific clock.
    ///
    /// # Panics
    ///
    /// Panics if capacity is 0.
    #[must_use]
    pub fn with_clock(capacity: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        assert!(capacity > 0, "Cache capacity must be greater than 0");
        Self {
            state: Mutex::new(State {
                entries: HashMap::with_capacity(capacity),
                order: VecDeque::with_capacity(capacity),
            }),
            capacity,
            ttl,
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a live entry, marking it most recently used.
    ///
    /// An expired entry is removed and reported as a miss.
    pub fn get(&self, key: CacheKey) -> Option<V> {
        let now = self.clock.now();
        let mut state = self.lock();

        let expired = state.entries.get(&key)?.is_expired(now);
        if expired {
            state.remove(key);
            tracing::debug!(key = key.value(), "cache entry expired");
            return None;
        }
        state.touch(key);
        state.entries.get(&key).map(|e| e.value.clone())
    }

    /// Store a value, evicting the least recently used entry on overflow.
    pub fn insert(&self, key: CacheKey, value: V) {
        let expires_at = self.clock.now().checked_add(self.ttl);
        let mut state = self.lock();

        state.entries.insert(key, Entry { value, expires_at });
        state.touch(key);

        while state.order.len() > self.capacity {
            if let Some(oldest) = state.order.pop_front() {
                state.entries.remove(&oldest);
                tracing::debug!(key = oldest.value(), "cache entry evicted");
            }
        }
    }

    /// Drop one entry.
    pub fn remove(&self, key: CacheKey) -> Option<V> {
        self.lock().remove(key).map(|e| e.value)
    }

    /// Remove every expired entry, returning how many were dropped.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut state = self.lock();
        let expired: Vec<CacheKey> = state
            .entries
            .iter()
            .filter(|(_, e)| e.is_expired(now))
            .map(|(k, _)| *k)
            .collect();
        for key in &expired {
            state.remove(*key);
        }
        expired.len()
    }

    /// Drop everything.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.order.clear();
    }
}

impl<V> ResultCache<V> {
    /// Number of stored entries, including expired ones not yet swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).entries.len()
    }

    /// True if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Lifetime of an entry.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn k(n: u64) -> CacheKey {
        CacheKey::from(n)
    }

    fn manual_cache(capacity: usize, ttl: Duration) -> (ResultCache<u32>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = ResultCache::with_clock(capacity, ttl, clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_get_after_insert() {
        let cache = ResultCache::new(4, DEFAULT_TTL);
        cache.insert(k(1), 10);
        assert_eq!(cache.get(k(1)), Some(10));
        assert_eq!(cache.get(k(2)), None);
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let cache = ResultCache::new(2, DEFAULT_TTL);
        cache.insert(k(1), 10);
        cache.insert(k(2), 20);
        // Touch 1 so 2 becomes the eviction candidate
        assert_eq!(cache.get(k(1)), Some(10));
        cache.insert(k(3), 30);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(k(2)), None);
        assert_eq!(cache.get(k(1)), Some(10));
        assert_eq!(cache.get(k(3)), Some(30));
    }

    #[test]
    fn test_reinsert_does_not_grow() {
        let cache = ResultCache::new(2, DEFAULT_TTL);
        cache.insert(k(1), 10);
        cache.insert(k(1), 11);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(k(1)), Some(11));
    }

    #[test]
    fn test_ttl_expiry_on_read() {
        let (cache, clock) = manual_cache(4, Duration::from_secs(300));
        cache.insert(k(1), 10);

        clock.advance(Duration::from_secs(299));
        assert_eq!(cache.get(k(1)), Some(10));

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get(k(1)), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let (cache, clock) = manual_cache(4, Duration::from_secs(10));
        cache.insert(k(1), 10);
        clock.advance(Duration::from_secs(5));
        cache.insert(k(2), 20);
        clock.advance(Duration::from_secs(6));

        assert_eq!(cache.sweep(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(k(2)), Some(20));
    }

    #[test]
    fn test_unrepresentable_ttl_never_expires() {
        let (cache, clock) = manual_cache(4, Duration::from_secs(u64::MAX));
        cache.insert(k(1), 10);

        clock.advance(Duration::from_secs(365 * 24 * 60 * 60));
        assert_eq!(cache.sweep(), 0);
        assert_eq!(cache.get(k(1)), Some(10));
    }

    #[test]
    fn test_clear_and_remove() {
        let cache = ResultCache::new(4, DEFAULT_TTL);
        cache.insert(k(1), 10);
        cache.insert(k(2), 20);
        assert_eq!(cache.remove(k(1)), Some(10));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_request_key_depends_on_every_part() {
        let music = MusicAnalysisData::with_energy_valence(0.8, 0.2);
        let base = CacheKey::for_request("track", 1, &music).unwrap();

        assert_eq!(base, CacheKey::for_request("track", 1, &music).unwrap());
        assert_ne!(base, CacheKey::for_request("other", 1, &music).unwrap());
        assert_ne!(base, CacheKey::for_request("track", 2, &music).unwrap());
        let changed = MusicAnalysisData::with_energy_valence(0.8, 0.3);
        assert_ne!(base, CacheKey::for_request("track", 1, &changed).unwrap());
    }

    #[test]
    fn test_shared_across_threads() {
        let cache = Arc::new(ResultCache::new(DEFAULT_CAPACITY, DEFAULT_TTL));
        let handles: Vec<_> = (0..8u64)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for j in 0..50u64 {
                        cache.insert(k(i * 100 + j), j);
                        let _ = cache.get(k(i * 100 + j));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.len() <= DEFAULT_CAPACITY);
    }

    #[test]
    #[should_panic(expected = "capacity must be greater than 0")]
    fn test_zero_capacity_panics() {
        let _cache: ResultCache<u32> = ResultCache::new(0, DEFAULT_TTL);
    }
}
