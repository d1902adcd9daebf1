//! High-resolution page clock.
//!
//! Event time stamps are milliseconds since the page was created, like a
//! browser's `performance.now()`. A manual clock only moves when advanced.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct PageClock {
    inner: Arc<ClockInner>,
}

#[derive(Debug)]
struct ClockInner {
    origin: Instant,
    /// Milliseconds added by `advance` (and the manual start value)
    offset_ms: AtomicU64,
    frozen: bool,
}

impl PageClock {
    /// A clock driven by wall time.
    pub fn system() -> Self {
        Self::build(0, false)
    }

    /// A clock frozen at `start_ms` that only moves through [`advance`](Self::advance).
    pub fn manual(start_ms: u64) -> Self {
        Self::build(start_ms, true)
    }

    fn build(start_ms: u64, frozen: bool) -> Self {
        Self {
            inner: Arc::new(ClockInner {
                origin: Instant::now(),
                offset_ms: AtomicU64::new(start_ms),
                frozen,
            }),
        }
    }

    /// Current time stamp in milliseconds.
    pub fn now(&self) -> f64 {
        let offset = self.inner.offset_ms.load(Ordering::SeqCst) as f64;
        if self.inner.frozen {
            offset
        } else {
            offset + self.inner.origin.elapsed().as_secs_f64() * 1000.0
        }
    }

    /// Move the clock forward (simulated latency).
    pub fn advance(&self, ms: u64) {
        self.inner.offset_ms.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn is_manual(&self) -> bool {
        self.inner.frozen
    }
}

impl Default for PageClock {
    fn default() -> Self {
        Self::system()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_only_moves_when_advanced() {
        let clock = PageClock::manual(1_000);
        assert_eq!(clock.now(), 1_000.0);
        clock.advance(250);
        assert_eq!(clock.now(), 1_250.0);
    }

    #[test]
    fn test_system_clock_includes_advance() {
        let clock = PageClock::system();
        clock.advance(10_000);
        assert!(clock.now() >= 10_000.0);
        assert!(!clock.is_manual());
    }
}
