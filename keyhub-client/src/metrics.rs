//! Process-wide counters for outbound marketplace calls and webhook checks
//!
//! Counters only ever grow. Request and webhook totals are derived from their
//! outcome counters at snapshot time, so `total == success + error` holds in
//! every snapshot even while other tasks are recording.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Collector shared via `Arc` by the client, the poller and the webhook validator
#[derive(Debug, Default)]
pub struct MetricsCollector {
    requests_success: AtomicU64,
    requests_error: AtomicU64,
    requests_retry: AtomicU64,
    webhook_valid: AtomicU64,
    webhook_invalid: AtomicU64,
    /// Call durations in milliseconds, append-only
    latencies: Mutex<Vec<f64>>,
}

/// Read-only view of the collector
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub requests_success: u64,
    pub requests_error: u64,
    pub requests_retry: u64,
    pub webhook_total: u64,
    pub webhook_valid: u64,
    pub webhook_invalid: u64,
    pub latency: LatencyStats,
}

/// Latency summary in milliseconds; all zero before the first sample
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LatencyStats {
    pub count: usize,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one finished outbound call
    pub fn record_request(&self, duration: Duration, success: bool) {
        if success {
            self.requests_success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.requests_error.fetch_add(1, Ordering::Relaxed);
        }
        self.latencies.lock().push(duration.as_secs_f64() * 1000.0);
    }

    /// Record a repeated attempt (e.g. a re-probe of inventory)
    pub fn record_retry(&self) {
        self.requests_retry.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_webhook(&self, valid: bool) {
        if valid {
            self.webhook_valid.fetch_add(1, Ordering::Relaxed);
        } else {
            self.webhook_invalid.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests_success = self.requests_success.load(Ordering::Relaxed);
        let requests_error = self.requests_error.load(Ordering::Relaxed);
        let webhook_valid = self.webhook_valid.load(Ordering::Relaxed);
        let webhook_invalid = self.webhook_invalid.load(Ordering::Relaxed);

        let mut samples = self.latencies.lock().clone();

        MetricsSnapshot {
            requests_total: requests_success + requests_error,
            requests_success,
            requests_error,
            requests_retry: self.requests_retry.load(Ordering::Relaxed),
            webhook_total: webhook_valid + webhook_invalid,
            webhook_valid,
            webhook_invalid,
            latency: LatencyStats::from_samples(&mut samples),
        }
    }
}

impl LatencyStats {
    fn from_samples(samples: &mut [f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        samples.sort_by(f64::total_cmp);

        let count = samples.len();
        let sum: f64 = samples.iter().sum();
        Self {
            count,
            avg: sum / count as f64,
            min: samples[0],
            max: samples[count - 1],
            p50: percentile(samples, 50.0),
            p95: percentile(samples, 95.0),
            p99: percentile(samples, 99.0),
        }
    }
}

/// Nearest-rank percentile over sorted, non-empty samples
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = (p * sorted.len() as f64 / 100.0).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_empty_snapshot() {
        let snap = MetricsCollector::new().snapshot();
        assert_eq!(snap.requests_total, 0);
        assert_eq!(snap.webhook_total, 0);
        assert_eq!(snap.latency, LatencyStats::default());
    }

    #[test]
    fn test_totals_match_outcomes() {
        let metrics = MetricsCollector::new();
        metrics.record_request(Duration::from_millis(10), true);
        metrics.record_request(Duration::from_millis(20), false);
        metrics.record_request(Duration::from_millis(30), true);
        metrics.record_retry();
        metrics.record_webhook(true);
        metrics.record_webhook(false);
        metrics.record_webhook(false);

        let snap = metrics.snapshot();
        assert_eq!(snap.requests_total, 3);
        assert_eq!(snap.requests_success, 2);
        assert_eq!(snap.requests_error, 1);
        assert_eq!(snap.requests_retry, 1);
        assert_eq!(snap.webhook_total, 3);
        assert_eq!(snap.webhook_valid, 1);
        assert_eq!(snap.webhook_invalid, 2);
    }

    #[test]
    fn test_latency_percentiles() {
        let metrics = MetricsCollector::new();
        for ms in (1..=100).rev() {
            metrics.record_request(Duration::from_millis(ms), true);
        }

        let lat = metrics.snapshot().latency;
        assert_eq!(lat.count, 100);
        assert!((lat.avg - 50.5).abs() < 1e-9);
        assert!((lat.min - 1.0).abs() < 1e-9);
        assert!((lat.max - 100.0).abs() < 1e-9);
        assert!((lat.p50 - 50.0).abs() < 1e-9);
        assert!((lat.p95 - 95.0).abs() < 1e-9);
        assert!((lat.p99 - 99.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_sample() {
        let metrics = MetricsCollector::new();
        metrics.record_request(Duration::from_millis(42), false);
        let lat = metrics.snapshot().latency;
        assert!((lat.p50 - 42.0).abs() < 1e-9);
        assert!((lat.p99 - 42.0).abs() < 1e-9);
    }

    #[test]
    fn test_concurrent_recording() {
        let metrics = Arc::new(MetricsCollector::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let metrics = metrics.clone();
                std::thread::spawn(move || {
                    for n in 0..500 {
                        metrics.record_request(Duration::from_millis(n), (n + i) % 3 != 0);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let snap = metrics.snapshot();
        assert_eq!(snap.requests_total, 4000);
        assert_eq!(snap.requests_total, snap.requests_success + snap.requests_error);
        assert_eq!(snap.latency.count, 4000);
    }
}
