//! Delivery counters.
//!
//! Counts what the pipeline handed to its beacon. Nothing here can tell
//! whether a record reached the server; beacons give no such signal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug)]
pub struct DeliveryStats {
    /// Records built and passed to the transport
    records_dispatched: AtomicU64,
    /// Beacons the back-end accepted for sending
    beacons_queued: AtomicU64,
    /// Beacons the back-end refused (queue full, worker gone)
    beacons_rejected: AtomicU64,
    session_start: DateTime<Utc>,
}

impl DeliveryStats {
    pub fn new() -> Self {
        Self {
            records_dispatched: AtomicU64::new(0),
            beacons_queued: AtomicU64::new(0),
            beacons_rejected: AtomicU64::new(0),
            session_start: Utc::now(),
        }
    }

    pub fn record_dispatched(&self) {
        self.records_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_beacon(&self, queued: bool) {
        if queued {
            self.beacons_queued.fetch_add(1, Ordering::Relaxed);
        } else {
            self.beacons_rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> DeliverySnapshot {
        DeliverySnapshot {
            records_dispatched: self.records_dispatched.load(Ordering::Relaxed),
            beacons_queued: self.beacons_queued.load(Ordering::Relaxed),
            beacons_rejected: self.beacons_rejected.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.snapshot();
        format!(
            "Delivery Statistics:\n\
             - Records dispatched: {}\n\
             - Beacons queued: {}\n\
             - Beacons rejected: {}\n\
             - Session duration: {} seconds",
            stats.records_dispatched,
            stats.beacons_queued,
            stats.beacons_rejected,
            stats.session_duration_secs
        )
    }

    pub fn reset(&self) {
        self.records_dispatched.store(0, Ordering::Relaxed);
        self.beacons_queued.store(0, Ordering::Relaxed);
        self.beacons_rejected.store(0, Ordering::Relaxed);
    }
}

impl Default for DeliveryStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`DeliveryStats`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliverySnapshot {
    pub records_dispatched: u64,
    pub beacons_queued: u64,
    pub beacons_rejected: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting() {
        let stats = DeliveryStats::new();
        stats.record_dispatched();
        stats.record_dispatched();
        stats.record_beacon(true);
        stats.record_beacon(false);

        let snap = stats.snapshot();
        assert_eq!(snap.records_dispatched, 2);
        assert_eq!(snap.beacons_queued, 1);
        assert_eq!(snap.beacons_rejected, 1);
    }

    #[test]
    fn test_reset() {
        let stats = DeliveryStats::new();
        stats.record_dispatched();
        stats.reset();
        assert_eq!(stats.snapshot().records_dispatched, 0);
    }

    #[test]
    fn test_summary_format() {
        let summary = DeliveryStats::new().summary();
        assert!(summary.contains("Records dispatched"));
        assert!(summary.contains("Beacons rejected"));
    }
}
