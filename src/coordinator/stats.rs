//! Request counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

/// Snapshot of coordinator activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoordinatorStats {
    /// Calls to `process`/`try_process`.
    pub requests: u64,
    /// Requests answered from the cache.
    pub cache_hits: u64,
    /// Requests that were computed.
    pub cache_misses: u64,
    /// Computed results whose strategy is `fallback`.
    pub fallbacks: u64,
    /// Time spent computing results (cache hits excluded).
    pub total_processing_time: Duration,
}

impl CoordinatorStats {
    /// Share of requests answered from the cache, 0 when nothing was requested.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.cache_hits + self.cache_misses;
        if lookups == 0 {
            0.0
        } else {
            self.cache_hits as f64 / lookups as f64
        }
    }

    /// Mean time per computed result.
    #[must_use]
    pub fn average_processing_time(&self) -> Duration {
        if self.cache_misses == 0 {
            return Duration::ZERO;
        }
        let nanos = self.total_processing_time.as_nanos() / u128::from(self.cache_misses);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

#[derive(Debug, Default)]
pub(super) struct StatsCounters {
    requests: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    fallbacks: AtomicU64,
    processing_nanos: AtomicU64,
}

impl StatsCounters {
    pub(super) fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn record_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn record_computed(&self, elapsed: Duration, fallback: bool) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
        if fallback {
            self.fallbacks.fetch_add(1, Ordering::Relaxed);
        }
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.processing_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    pub(super) fn snapshot(&self) -> CoordinatorStats {
        CoordinatorStats {
            requests: self.requests.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            total_processing_time: Duration::from_nanos(self.processing_nanos.load(Ordering::Relaxed)),
        }
    }

    pub(super) fn reset(&self) {
        for counter in [
            &self.requests,
            &self.cache_hits,
            &self.cache_misses,
            &self.fallbacks,
            &self.processing_nanos,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stats() {
        let stats = CoordinatorStats::default();
        assert!(stats.hit_rate().abs() < f64::EPSILON);
        assert_eq!(stats.average_processing_time(), Duration::ZERO);
    }

    #[test]
    fn test_counters_snapshot() {
        let counters = StatsCounters::default();
        counters.record_request();
        counters.record_computed(Duration::from_millis(4), false);
        counters.record_request();
        counters.record_computed(Duration::from_millis(2), true);
        counters.record_request();
        counters.record_hit();

        let stats = counters.snapshot();
        assert_eq!(stats.requests, 3);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.cache_misses, 2);
        assert_eq!(stats.fallbacks, 1);
        assert_eq!(stats.average_processing_time(), Duration::from_millis(3));
        assert!((stats.hit_rate() - 1.0 / 3.0).abs() < 1e-12);

        counters.reset();
        assert_eq!(counters.snapshot(), CoordinatorStats::default());
    }
}
