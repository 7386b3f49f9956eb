//! Resolution metrics.
//!
//! Counters are owned by a single resolver and therefore describe one unit
//! of work (a request or a sitemap build).

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters for one resolver instance.
#[derive(Debug, Default)]
pub struct ResolverMetrics {
    /// Lookups answered from one of the resolver caches
    cache_hits: AtomicUsize,

    /// Lookups that had to be computed
    cache_misses: AtomicUsize,

    /// Queries issued to the content store
    store_queries: AtomicUsize,

    /// Translation groups with more than one page for the same locale
    duplicate_locales: AtomicUsize,

    /// Eligibility checks run by collectors for translated targets
    eligibility_checks: AtomicUsize,
}

impl ResolverMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_query(&self) {
        self.store_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicate_locale(&self) {
        self.duplicate_locales.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eligibility_check(&self) {
        self.eligibility_checks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> usize {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn store_queries(&self) -> usize {
        self.store_queries.load(Ordering::Relaxed)
    }

    pub fn duplicate_locales(&self) -> usize {
        self.duplicate_locales.load(Ordering::Relaxed)
    }

    pub fn eligibility_checks(&self) -> usize {
        self.eligibility_checks.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let hits = self.cache_hits();
        let misses = self.cache_misses();
        let total = hits + misses;
        let cache_hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate,
            store_queries: self.store_queries(),
            duplicate_locales: self.duplicate_locales(),
            eligibility_checks: self.eligibility_checks(),
        }
    }
}

/// Snapshot of [`ResolverMetrics`].
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub cache_hits: usize,
    pub cache_misses: usize,
    /// Cache hit rate as a percentage (0-100)
    pub cache_hit_rate: f64,
    pub store_queries: usize,
    pub duplicate_locales: usize,
    pub eligibility_checks: usize,
}
