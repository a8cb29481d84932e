//! Request statistics for the prediction client.

use crate::error::{ErrorKind, Operation};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Latency samples kept per operation
const MAX_SAMPLES: usize = 1000;

/// Metrics collector for client requests
pub struct ClientMetrics {
    /// Total requests issued (every operation, including failed ones)
    pub requests_issued: AtomicU64,
    /// Total requests that produced a result
    pub requests_succeeded: AtomicU64,
    /// Failures by error kind
    failures_by_kind: RwLock<HashMap<ErrorKind, u64>>,
    /// Round-trip latencies in microseconds, by operation
    latencies: RwLock<HashMap<Operation, Vec<u64>>>,
    /// Responses dropped because a newer one was cached
    pub stale_discarded: AtomicU64,
    start_time: Instant,
}

impl ClientMetrics {
    pub fn new() -> Self {
        Self {
            requests_issued: AtomicU64::new(0),
            requests_succeeded: AtomicU64::new(0),
            failures_by_kind: RwLock::new(HashMap::new()),
            latencies: RwLock::new(HashMap::new()),
            stale_discarded: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_issued(&self) {
        self.requests_issued.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful round trip
    pub fn record_success(&self, operation: Operation, latency: Duration) {
        self.requests_succeeded.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut latencies) = self.latencies.write() {
            let samples = latencies.entry(operation).or_insert_with(Vec::new);
            samples.push(latency.as_micros() as u64);
            if samples.len() > MAX_SAMPLES {
                samples.drain(0..MAX_SAMPLES / 2);
            }
        }
    }

    pub fn record_failure(&self, kind: ErrorKind) {
        if let Ok(mut by_kind) = self.failures_by_kind.write() {
            *by_kind.entry(kind).or_insert(0) += 1;
        }
    }

    pub fn record_stale(&self) {
        self.stale_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failures(&self, kind: ErrorKind) -> u64 {
        self.failures_by_kind
            .read()
            .map(|by_kind| by_kind.get(&kind).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn total_failures(&self) -> u64 {
        self.failures_by_kind
            .read()
            .map(|by_kind| by_kind.values().sum())
            .unwrap_or(0)
    }

    /// Latency statistics for one operation
    pub fn latency_stats(&self, operation: Operation) -> LatencyStats {
        let Ok(latencies) = self.latencies.read() else {
            return LatencyStats::default();
        };
        let Some(samples) = latencies.get(&operation).filter(|s| !s.is_empty()) else {
            return LatencyStats::default();
        };

        let mut sorted = samples.clone();
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let percentile = |p: f64| sorted[((count as f64 * p) as usize).min(count - 1)];

        LatencyStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: percentile(0.50),
            p95_us: percentile(0.95),
            p99_us: percentile(0.99),
            max_us: sorted[count - 1],
        }
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let issued = self.requests_issued.load(Ordering::Relaxed);
        let succeeded = self.requests_succeeded.load(Ordering::Relaxed);
        let success_rate = if issued > 0 {
            (succeeded as f64 / issued as f64) * 100.0
        } else {
            0.0
        };

        info!("==================== PREDICTION CLIENT SUMMARY ====================");
        info!(
            "Requests issued: {:>6}  succeeded: {:>6}  ({:>5.1}%)  uptime: {:.0}s",
            issued,
            succeeded,
            success_rate,
            self.uptime().as_secs_f64()
        );
        info!(
            "Stale responses discarded: {}",
            self.stale_discarded.load(Ordering::Relaxed)
        );

        for kind in [
            ErrorKind::Input,
            ErrorKind::Transport,
            ErrorKind::Backend,
            ErrorKind::Generation,
        ] {
            let count = self.failures(kind);
            if count > 0 {
                info!("  {:<10} failures: {}", kind.as_str(), count);
            }
        }

        for operation in [
            Operation::SinglePredict,
            Operation::BatchPredict,
            Operation::Generate,
        ] {
            let stats = self.latency_stats(operation);
            if stats.count > 0 {
                info!(
                    "  {:<22} latency (us): mean={} p50={} p95={} p99={} max={} (calls={})",
                    operation.as_str(),
                    stats.mean_us,
                    stats.p50_us,
                    stats.p95_us,
                    stats.p99_us,
                    stats.max_us,
                    stats.count
                );
            }
        }
        info!("===================================================================");
    }
}

impl Default for ClientMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Round-trip latency statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}
