//! Logical access clock.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic tick counter used to order buffer accesses.
///
/// Eviction only cares about which buffer was touched last, so a counter is
/// enough and avoids wall-clock skew between threads.
#[derive(Debug, Default)]
pub struct LogicalClock {
    now: AtomicU64,
}

impl LogicalClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock and return the new tick.
    #[inline]
    pub fn tick(&self) -> u64 {
        self.now.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Current tick without advancing.
    #[inline]
    pub fn now(&self) -> u64 {
        self.now.load(Ordering::Relaxed)
    }
}
