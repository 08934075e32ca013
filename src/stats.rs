//! Crawl statistics collection
//!
//! One collector instance is constructed by the orchestrator and handed to
//! every fetcher; it must stay correct under arbitrary concurrent callers.
//! The request counter ticks once per underlying network attempt (so retries
//! are visible), while success/failure tick once per logical fetch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Concurrent-safe running counters for a whole crawl run
#[derive(Debug, Default)]
pub struct StatsCollector {
    requests: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    started_at: Mutex<Option<Instant>>,
    finished_at: Mutex<Option<Instant>>,
}

/// Point-in-time view of the collector
#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    pub requests: u64,
    pub successes: u64,
    pub failures: u64,

    /// successes / requests, 0.0 when no requests were made
    pub success_rate: f64,

    /// Wall-clock duration; None before `mark_start`
    pub duration: Option<Duration>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one network attempt (including renderer calls and retries)
    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one logical fetch that produced usable content
    pub fn record_success(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one logical fetch that was abandoned
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Marks the start of the run; the first call wins
    pub fn mark_start(&self) {
        let mut started = self.started_at.lock().unwrap();
        if started.is_none() {
            *started = Some(Instant::now());
        }
    }

    /// Marks the end of the run
    pub fn mark_finished(&self) {
        let mut finished = self.finished_at.lock().unwrap();
        *finished = Some(Instant::now());
    }

    /// Computes a snapshot of the current counters
    pub fn snapshot(&self) -> StatsSnapshot {
        let requests = self.requests.load(Ordering::Relaxed);
        let successes = self.successes.load(Ordering::Relaxed);
        let failures = self.failures.load(Ordering::Relaxed);

        let success_rate = if requests > 0 {
            successes as f64 / requests as f64
        } else {
            0.0
        };

        let started = *self.started_at.lock().unwrap();
        let finished = *self.finished_at.lock().unwrap();
        let duration = match (started, finished) {
            (Some(start), Some(end)) => Some(end.duration_since(start)),
            (Some(start), None) => Some(start.elapsed()),
            _ => None,
        };

        StatsSnapshot {
            requests,
            successes,
            failures,
            success_rate,
            duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_empty_snapshot() {
        let stats = StatsCollector::new();
        let snapshot = stats.snapshot();

        assert_eq!(snapshot.requests, 0);
        assert_eq!(snapshot.successes, 0);
        assert_eq!(snapshot.failures, 0);
        assert_eq!(snapshot.success_rate, 0.0);
        assert!(snapshot.duration.is_none());
    }

    #[test]
    fn test_success_rate() {
        let stats = StatsCollector::new();
        stats.record_request();
        stats.record_request();
        stats.record_request();
        stats.record_request();
        stats.record_success();
        stats.record_success();
        stats.record_success();
        stats.record_failure();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.requests, 4);
        assert_eq!(snapshot.successes, 3);
        assert_eq!(snapshot.failures, 1);
        assert!((snapshot.success_rate - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_duration_requires_start() {
        let stats = StatsCollector::new();
        assert!(stats.snapshot().duration.is_none());

        stats.mark_start();
        stats.mark_finished();
        assert!(stats.snapshot().duration.is_some());
    }

    #[test]
    fn test_concurrent_increments() {
        let stats = Arc::new(StatsCollector::new());
        let mut handles = Vec::new();

        for _ in 0..8 {
            let stats = Arc::clone(&stats);
            handles.push(std::thread::spawn(move || {
                for _ in 0..1000 {
                    stats.record_request();
                    stats.record_success();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.requests, 8000);
        assert_eq!(snapshot.successes, 8000);
    }
}
