use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use log::trace;

/// Counters for store traffic, reported when the store is closed.
#[derive(Debug)]
pub struct StorageMetrics {
    counter_updates: AtomicU64,
    position_appends: AtomicU64,
    replacements: AtomicU64,
    transactions: AtomicU64,
    read_ops: AtomicU64,
    failed_ops: AtomicU64,
    total_bytes_written: AtomicU64,
    start_time: Instant,
}

impl StorageMetrics {
    pub fn new() -> Self {
        Self {
            counter_updates: AtomicU64::new(0),
            position_appends: AtomicU64::new(0),
            replacements: AtomicU64::new(0),
            transactions: AtomicU64::new(0),
            read_ops: AtomicU64::new(0),
            failed_ops: AtomicU64::new(0),
            total_bytes_written: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_counter_updates(&self, count: usize) {
        self.counter_updates.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_position_appends(&self, count: usize) {
        self.position_appends.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn increment_replacements(&self) {
        self.replacements.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_transactions(&self) {
        self.transactions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_reads(&self) {
        self.read_ops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failed_ops(&self) {
        self.failed_ops.fetch_add(1, Ordering::Relaxed);
        trace!("Failed store operation recorded. Total failures: {}", self.failed_ops.load(Ordering::Relaxed));
    }

    pub fn record_bytes_written(&self, bytes: u64) {
        self.total_bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> StorageMetricsStats {
        StorageMetricsStats {
            counter_updates: self.counter_updates.load(Ordering::Relaxed),
            position_appends: self.position_appends.load(Ordering::Relaxed),
            replacements: self.replacements.load(Ordering::Relaxed),
            transactions: self.transactions.load(Ordering::Relaxed),
            read_operations: self.read_ops.load(Ordering::Relaxed),
            failed_operations: self.failed_ops.load(Ordering::Relaxed),
            bytes_written: self.total_bytes_written.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs_f64(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageMetricsStats {
    pub counter_updates: u64,
    pub position_appends: u64,
    pub replacements: u64,
    pub transactions: u64,
    pub read_operations: u64,
    pub failed_operations: u64,
    pub bytes_written: u64,
    pub uptime_seconds: f64,
}

impl StorageMetricsStats {
    pub fn writes(&self) -> u64 {
        self.counter_updates + self.position_appends + self.replacements
    }

    pub fn transactions_per_second(&self) -> f64 {
        if self.uptime_seconds <= 0.0 {
            return 0.0;
        }
        self.transactions as f64 / self.uptime_seconds
    }
}

impl std::fmt::Display for StorageMetricsStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} counter updates, {} position appends, {} replacements in {} transactions \
             ({:.1}/s), {} reads, {} failures, {} bytes written",
            self.counter_updates,
            self.position_appends,
            self.replacements,
            self.transactions,
            self.transactions_per_second(),
            self.read_operations,
            self.failed_operations,
            self.bytes_written
        )
    }
}

impl Default for StorageMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = StorageMetrics::new();
        metrics.record_counter_updates(3);
        metrics.record_position_appends(2);
        metrics.increment_replacements();
        metrics.increment_transactions();
        metrics.increment_failed_ops();

        let stats = metrics.get_stats();
        assert_eq!(stats.writes(), 6);
        assert_eq!(stats.transactions, 1);
        assert_eq!(stats.failed_operations, 1);
        assert!(stats.to_string().contains("3 counter updates"));
    }
}
