//! Cache statistics.
//!
//! Two kinds of numbers:
//! - [`CacheStatistics`] - managed vs dumped bytes, recomputed from the
//!   records on demand
//! - [`ManagerStats`] - cumulative event counters, updated lock-free

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::buffer::BufferInfo;
use crate::common::ByteSize;

/// Aggregate sizes over all registered buffers.
///
/// # Example
/// ```
/// use residency::CacheStatistics;
///
/// let stats = CacheStatistics { total_managed: 4000, total_dumped: 1000 };
/// assert_eq!(stats.total_resident(), 3000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStatistics {
    /// Sum of all buffer sizes, regardless of residency.
    pub total_managed: usize,

    /// Sum of the sizes of dumped buffers.
    pub total_dumped: usize,
}

impl CacheStatistics {
    /// Sum over a set of records.
    pub fn from_infos<'a>(infos: impl IntoIterator<Item = &'a BufferInfo>) -> Self {
        infos.into_iter().fold(Self::default(), |mut acc, info| {
            acc.total_managed += info.size;
            if !info.is_resident() {
                acc.total_dumped += info.size;
            }
            acc
        })
    }

    /// Bytes currently held in memory.
    #[inline]
    pub fn total_resident(&self) -> usize {
        self.total_managed - self.total_dumped
    }
}

impl fmt::Display for CacheStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cache {{ managed: {}, resident: {}, dumped: {} }}",
            ByteSize::from_bytes(self.total_managed),
            ByteSize::from_bytes(self.total_resident()),
            ByteSize::from_bytes(self.total_dumped)
        )
    }
}

/// Counters tracked by the buffer manager.
///
/// All fields are atomic for lock-free, thread-safe updates. `Relaxed`
/// ordering is enough: counters are independent and only read for display.
#[derive(Debug, Default)]
pub struct ManagerStats {
    /// Buffers written to disk.
    pub dumps: AtomicU64,

    /// Buffers read back from disk.
    pub restores: AtomicU64,

    /// Bytes written to disk by dumps.
    pub bytes_dumped: AtomicU64,

    /// Bytes read back by restores.
    pub bytes_restored: AtomicU64,

    /// Policy victims skipped because they were locked.
    pub evictions_skipped: AtomicU64,

    /// Policy victims whose dump failed.
    pub evictions_failed: AtomicU64,
}

impl ManagerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_dump(&self, bytes: usize) {
        self.dumps.fetch_add(1, Ordering::Relaxed);
        self.bytes_dumped.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_restore(&self, bytes: usize) {
        self.restores.fetch_add(1, Ordering::Relaxed);
        self.bytes_restored.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Get a snapshot of current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            dumps: self.dumps.load(Ordering::Relaxed),
            restores: self.restores.load(Ordering::Relaxed),
            bytes_dumped: self.bytes_dumped.load(Ordering::Relaxed),
            bytes_restored: self.bytes_restored.load(Ordering::Relaxed),
            evictions_skipped: self.evictions_skipped.load(Ordering::Relaxed),
            evictions_failed: self.evictions_failed.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.dumps.store(0, Ordering::Relaxed);
        self.restores.store(0, Ordering::Relaxed);
        self.bytes_dumped.store(0, Ordering::Relaxed);
        self.bytes_restored.store(0, Ordering::Relaxed);
        self.evictions_skipped.store(0, Ordering::Relaxed);
        self.evictions_failed.store(0, Ordering::Relaxed);
    }
}

/// A point-in-time copy of [`ManagerStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub dumps: u64,
    pub restores: u64,
    pub bytes_dumped: u64,
    pub bytes_restored: u64,
    pub evictions_skipped: u64,
    pub evictions_failed: u64,
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ dumps: {}, restores: {}, skipped: {}, failed: {} }}",
            self.dumps, self.restores, self.evictions_skipped, self.evictions_failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Residency;
    use crate::common::BufferId;

    fn info(id: u64, size: usize, residency: Residency) -> BufferInfo {
        BufferInfo {
            id: BufferId::new(id),
            size,
            residency,
            lock_count: 0,
            last_access: 0,
        }
    }

    #[test]
    fn test_statistics_from_infos() {
        let infos = [
            info(1, 100, Residency::Resident),
            info(2, 250, Residency::Dumped),
            info(3, 50, Residency::Dumped),
        ];

        let stats = CacheStatistics::from_infos(&infos);
        assert_eq!(stats.total_managed, 400);
        assert_eq!(stats.total_dumped, 300);
        assert_eq!(stats.total_resident(), 100);
    }

    #[test]
    fn test_statistics_empty() {
        let none: [BufferInfo; 0] = [];
        let stats = CacheStatistics::from_infos(&none);
        assert_eq!(stats, CacheStatistics::default());
    }

    #[test]
    fn test_statistics_display() {
        let stats = CacheStatistics {
            total_managed: 2048,
            total_dumped: 1024,
        };
        assert_eq!(
            stats.to_string(),
            "Cache { managed: 2 KiB, resident: 1 KiB, dumped: 1 KiB }"
        );
    }

    #[test]
    fn test_counters() {
        let stats = ManagerStats::new();
        stats.record_dump(4000);
        stats.record_dump(1000);
        stats.record_restore(4000);
        stats.evictions_skipped.fetch_add(1, Ordering::Relaxed);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.dumps, 2);
        assert_eq!(snapshot.bytes_dumped, 5000);
        assert_eq!(snapshot.restores, 1);
        assert_eq!(snapshot.bytes_restored, 4000);
        assert!(snapshot.to_string().contains("skipped: 1"));

        stats.reset();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }
}
