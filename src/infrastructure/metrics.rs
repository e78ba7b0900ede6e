//! Metrics collection for the polling loop
//!
//! Lock-free counters using atomic operations. Updated once per cycle,
//! logged as a snapshot periodically and at shutdown.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime};

/// Cycle metrics collector
///
/// Thread-safe counters updated by the engine.
pub struct MetricsCollector {
    /// Cycles that began fetching
    cycles_started: AtomicU64,
    /// Cycles that reached the end of matching
    cycles_completed: AtomicU64,
    /// Cycles abandoned because a venue fetch failed
    cycles_aborted: AtomicU64,
    /// Completed cycles where the book did not cross
    no_opportunity: AtomicU64,
    /// Trade legs emitted across all cycles
    legs_emitted: AtomicU64,
    /// Price levels dropped by normalization
    quotes_rejected: AtomicU64,
    /// Ledger writes that failed
    persist_failures: AtomicU64,
    /// Last completed cycle (Unix millis)
    last_cycle_time: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

/// Metrics snapshot for logging
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsSnapshot {
    pub cycles_started: u64,
    pub cycles_completed: u64,
    pub cycles_aborted: u64,
    pub no_opportunity: u64,
    pub legs_emitted: u64,
    pub quotes_rejected: u64,
    pub persist_failures: u64,
    pub uptime_seconds: u64,
}

impl MetricsCollector {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self {
            cycles_started: AtomicU64::new(0),
            cycles_completed: AtomicU64::new(0),
            cycles_aborted: AtomicU64::new(0),
            no_opportunity: AtomicU64::new(0),
            legs_emitted: AtomicU64::new(0),
            quotes_rejected: AtomicU64::new(0),
            persist_failures: AtomicU64::new(0),
            last_cycle_time: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    #[inline]
    pub fn record_cycle_started(&self) {
        self.cycles_started.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_cycle_aborted(&self) {
        self.cycles_aborted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a cycle that ran to completion
    #[inline]
    pub fn record_cycle_completed(&self, legs: usize, crossed: bool) {
        self.cycles_completed.fetch_add(1, Ordering::Relaxed);
        self.legs_emitted.fetch_add(legs as u64, Ordering::Relaxed);
        if !crossed {
            self.no_opportunity.fetch_add(1, Ordering::Relaxed);
        }
        self.update_last_cycle_time();
    }

    #[inline]
    pub fn record_rejected(&self, count: usize) {
        self.quotes_rejected.fetch_add(count as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_persist_failure(&self) {
        self.persist_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn update_last_cycle_time(&self) {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        self.last_cycle_time.store(now, Ordering::Relaxed);
    }

    /// Milliseconds since the last completed cycle, if any
    pub fn since_last_cycle_ms(&self) -> Option<u64> {
        let last = self.last_cycle_time.load(Ordering::Relaxed);
        if last == 0 {
            return None;
        }

        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        Some(now.saturating_sub(last))
    }

    /// Get current snapshot of metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cycles_started: self.cycles_started.load(Ordering::Relaxed),
            cycles_completed: self.cycles_completed.load(Ordering::Relaxed),
            cycles_aborted: self.cycles_aborted.load(Ordering::Relaxed),
            no_opportunity: self.no_opportunity.load(Ordering::Relaxed),
            legs_emitted: self.legs_emitted.load(Ordering::Relaxed),
            quotes_rejected: self.quotes_rejected.load(Ordering::Relaxed),
            persist_failures: self.persist_failures.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new();
        let snapshot = collector.snapshot();

        assert_eq!(snapshot.cycles_started, 0);
        assert_eq!(snapshot.cycles_completed, 0);
        assert_eq!(snapshot.legs_emitted, 0);
        assert_eq!(collector.since_last_cycle_ms(), None);
    }

    #[test]
    fn test_record_cycles() {
        let collector = MetricsCollector::new();

        collector.record_cycle_started();
        collector.record_cycle_completed(4, true);
        collector.record_cycle_started();
        collector.record_cycle_completed(0, false);
        collector.record_cycle_started();
        collector.record_cycle_aborted();
        collector.record_rejected(2);

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.cycles_started, 3);
        assert_eq!(snapshot.cycles_completed, 2);
        assert_eq!(snapshot.cycles_aborted, 1);
        assert_eq!(snapshot.no_opportunity, 1);
        assert_eq!(snapshot.legs_emitted, 4);
        assert_eq!(snapshot.quotes_rejected, 2);
        assert!(collector.since_last_cycle_ms().is_some());
    }

    #[test]
    fn test_persist_failures() {
        let collector = MetricsCollector::new();
        collector.record_persist_failure();
        assert_eq!(collector.snapshot().persist_failures, 1);
    }
}
