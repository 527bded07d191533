//! Broadcaster metrics for observability

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for a single broadcaster instance
#[derive(Debug, Default)]
pub struct BroadcastMetrics {
    /// Ticks that ran (including skipped ones)
    ticks: AtomicU64,
    /// Ticks skipped because no sink was eligible
    idle_ticks: AtomicU64,
    /// Ticks skipped because the sensor fetch failed
    fetch_failures: AtomicU64,
    /// Ticks skipped because encoding failed
    encode_failures: AtomicU64,
    /// Successful sink writes
    delivered: AtomicU64,
    /// Failed sink writes
    write_failures: AtomicU64,
}

impl BroadcastMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_ticks(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_idle_ticks(&self) {
        self.idle_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_fetch_failures(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_encode_failures(&self) {
        self.encode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_write_failures(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> BroadcastStats {
        BroadcastStats {
            ticks: self.ticks(),
            idle_ticks: self.idle_ticks.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            encode_failures: self.encode_failures.load(Ordering::Relaxed),
            delivered: self.delivered(),
            write_failures: self.write_failures(),
        }
    }
}

/// Snapshot of broadcaster counters (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastStats {
    pub ticks: u64,
    pub idle_ticks: u64,
    pub fetch_failures: u64,
    pub encode_failures: u64,
    pub delivered: u64,
    pub write_failures: u64,
}

impl fmt::Display for BroadcastStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ticks: {} ({} idle)", self.ticks, self.idle_ticks)?;
        writeln!(f, "Fetch failures: {}", self.fetch_failures)?;
        writeln!(f, "Encode failures: {}", self.encode_failures)?;
        writeln!(f, "Lines delivered: {}", self.delivered)?;
        write!(f, "Write failures: {}", self.write_failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let metrics = BroadcastMetrics::new();
        metrics.inc_ticks();
        metrics.inc_ticks();
        metrics.inc_idle_ticks();
        metrics.inc_delivered();
        metrics.inc_write_failures();

        let stats = metrics.snapshot();
        assert_eq!(stats.ticks, 2);
        assert_eq!(stats.idle_ticks, 1);
        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.write_failures, 1);
        assert_eq!(stats.fetch_failures, 0);
    }

    #[test]
    fn test_stats_display() {
        let stats = BroadcastStats {
            ticks: 10,
            idle_ticks: 4,
            delivered: 12,
            ..Default::default()
        };
        let output = stats.to_string();
        assert!(output.contains("Ticks: 10 (4 idle)"));
        assert!(output.contains("Lines delivered: 12"));
    }
}
