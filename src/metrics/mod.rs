//! Metrics collection module
//!
//! Tracks backend attempts, latency, and extraction outcomes for `/stats`.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Response times kept per backend
const LATENCY_WINDOW: usize = 100;

#[derive(Debug, Default)]
struct BackendCounters {
    attempts: u64,
    successes: u64,
    failures: u64,
    latencies: VecDeque<u64>,
}

/// Process-wide metrics
#[derive(Debug, Default)]
pub struct Metrics {
    searches: AtomicU64,
    failed_searches: AtomicU64,
    extractions_ok: AtomicU64,
    extractions_failed: AtomicU64,
    backends: RwLock<HashMap<String, BackendCounters>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a search request; `ok` is false when every backend failed
    pub fn record_search(&self, ok: bool) {
        self.searches.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.failed_searches.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record one backend attempt
    pub fn record_attempt(&self, backend: &str, ok: bool, time_ms: u64) {
        let mut backends = self.write();
        let counters = backends.entry(backend.to_string()).or_default();
        counters.attempts += 1;
        if ok {
            counters.successes += 1;
        } else {
            counters.failures += 1;
        }
        if counters.latencies.len() >= LATENCY_WINDOW {
            counters.latencies.pop_front();
        }
        counters.latencies.push_back(time_ms);
    }

    /// Record one URL extraction
    pub fn record_extraction(&self, ok: bool) {
        let counter = if ok {
            &self.extractions_ok
        } else {
            &self.extractions_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Average latency over the recent window
    pub fn get_avg_response_time(&self, backend: &str) -> Option<u64> {
        let backends = self.read();
        let latencies = &backends.get(backend)?.latencies;
        if latencies.is_empty() {
            None
        } else {
            Some(latencies.iter().sum::<u64>() / latencies.len() as u64)
        }
    }

    /// Success percentage for a backend (100 when never tried)
    pub fn get_reliability(&self, backend: &str) -> f64 {
        let backends = self.read();
        match backends.get(backend) {
            Some(c) if c.attempts > 0 => c.successes as f64 / c.attempts as f64 * 100.0,
            _ => 100.0,
        }
    }

    /// Snapshot for the stats endpoint
    pub fn snapshot(&self) -> MetricsSnapshot {
        let backends = self
            .read()
            .iter()
            .map(|(name, c)| {
                let avg = if c.latencies.is_empty() {
                    None
                } else {
                    Some(c.latencies.iter().sum::<u64>() / c.latencies.len() as u64)
                };
                (
                    name.clone(),
                    BackendStats {
                        attempts: c.attempts,
                        successes: c.successes,
                        failures: c.failures,
                        avg_response_time_ms: avg,
                    },
                )
            })
            .collect();

        MetricsSnapshot {
            searches: self.searches.load(Ordering::Relaxed),
            failed_searches: self.failed_searches.load(Ordering::Relaxed),
            extractions_ok: self.extractions_ok.load(Ordering::Relaxed),
            extractions_failed: self.extractions_failed.load(Ordering::Relaxed),
            backends,
        }
    }

    // A panic while holding the lock leaves the counters usable
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, BackendCounters>> {
        self.backends.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, BackendCounters>> {
        self.backends.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// Statistics for a single backend
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BackendStats {
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub avg_response_time_ms: Option<u64>,
}

/// Point-in-time copy of all counters
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub searches: u64,
    pub failed_searches: u64,
    pub extractions_ok: u64,
    pub extractions_failed: u64,
    pub backends: BTreeMap<String, BackendStats>,
}
