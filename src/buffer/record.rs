//! Buffer record - per-buffer bookkeeping.
//!
//! A [`BufferRecord`] holds one registered buffer plus the metadata the
//! manager needs to decide whether it may leave memory:
//! - Size and last-access tick
//! - Lock count for reference counting
//! - Residency (bytes in memory, or parked in a dump file)

use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{ArcMutexGuard, Mutex, RawMutex, RwLock};

use crate::buffer::AlignedBytes;
use crate::common::BufferId;
use crate::storage::DumpFile;

/// Where a buffer's bytes currently live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Residency {
    Resident,
    Dumped,
}

impl fmt::Display for Residency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Residency::Resident => write!(f, "resident"),
            Residency::Dumped => write!(f, "dumped"),
        }
    }
}

/// The bytes of a buffer, or where they went.
#[derive(Debug)]
pub(crate) enum Slot {
    Resident(AlignedBytes),
    /// Bytes handed to a dump that is still writing its file.
    Dumping,
    Dumped(DumpFile),
    /// Unregistered; any dump file is already deleted.
    Released,
}

impl Slot {
    #[inline]
    pub(crate) fn bytes(&self) -> Option<&[u8]> {
        match self {
            Slot::Resident(bytes) => Some(bytes.as_slice()),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn bytes_mut(&mut self) -> Option<&mut [u8]> {
        match self {
            Slot::Resident(bytes) => Some(bytes.as_mut_slice()),
            _ => None,
        }
    }
}

/// Point-in-time view of one record, as seen by policies and monitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferInfo {
    pub id: BufferId,
    pub size: usize,
    pub residency: Residency,
    pub lock_count: u32,
    pub last_access: u64,
}

impl BufferInfo {
    #[inline]
    pub fn is_resident(&self) -> bool {
        self.residency == Residency::Resident
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.lock_count > 0
    }
}

const RESIDENT: u8 = 0;
const DUMPING: u8 = 1;
const DUMPED: u8 = 2;

/// A registered buffer.
///
/// # Thread Safety
/// - `slot`: `RwLock` behind an `Arc` so lock guards can own their access
/// - `lock_count`: `AtomicU32` for lock-free reference counting
/// - `size`, `state`, `last_access`: atomics, written only while the
///   manager holds its table write lock (or, for `last_access`, any lock)
/// - `transfer`: held by a dump from the moment it takes the bytes until
///   its file is installed or discarded
///
/// `state` mirrors the slot so residency can be queried without waiting
/// on a writer holding the slot.
pub struct BufferRecord {
    id: BufferId,
    size: AtomicUsize,
    last_access: AtomicU64,
    lock_count: AtomicU32,
    state: AtomicU8,
    transfer: Arc<Mutex<()>>,
    slot: Arc<RwLock<Slot>>,
}

impl BufferRecord {
    /// Create a resident record owning `bytes`.
    pub(crate) fn new(id: BufferId, bytes: AlignedBytes, tick: u64) -> Self {
        Self {
            id,
            size: AtomicUsize::new(bytes.len()),
            last_access: AtomicU64::new(tick),
            lock_count: AtomicU32::new(0),
            state: AtomicU8::new(RESIDENT),
            transfer: Arc::new(Mutex::new(())),
            slot: Arc::new(RwLock::new(Slot::Resident(bytes))),
        }
    }

    #[inline]
    pub fn id(&self) -> BufferId {
        self.id
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size.load(Ordering::Acquire)
    }

    #[inline]
    pub fn last_access(&self) -> u64 {
        self.last_access.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn touch(&self, tick: u64) {
        self.last_access.fetch_max(tick, Ordering::Relaxed);
    }

    // ========================================================================
    // Lock count operations (Atomic)
    // ========================================================================

    /// Increment the lock count. Returns the new count.
    #[inline]
    pub(crate) fn pin(&self) -> u32 {
        self.lock_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Decrement the lock count. Returns the new count.
    ///
    /// # Panics
    /// Panics if the lock count is already 0.
    #[inline]
    pub(crate) fn unpin(&self) -> u32 {
        let old = self.lock_count.fetch_sub(1, Ordering::AcqRel);
        assert!(old > 0, "lock count underflow");
        old - 1
    }

    #[inline]
    pub fn lock_count(&self) -> u32 {
        self.lock_count.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.lock_count() > 0
    }

    // ========================================================================
    // Residency
    // ========================================================================

    #[inline]
    pub fn is_dumped(&self) -> bool {
        self.state.load(Ordering::Acquire) == DUMPED
    }

    /// Bytes are in the slot and may be pinned.
    #[inline]
    pub(crate) fn is_resident(&self) -> bool {
        self.state.load(Ordering::Acquire) == RESIDENT
    }

    #[inline]
    pub(crate) fn is_dumping(&self) -> bool {
        self.state.load(Ordering::Acquire) == DUMPING
    }

    /// Residency as policies see it. A dump in flight still counts as
    /// resident until its file is installed.
    #[inline]
    pub fn residency(&self) -> Residency {
        if self.is_dumped() {
            Residency::Dumped
        } else {
            Residency::Resident
        }
    }

    #[inline]
    pub(crate) fn slot(&self) -> &Arc<RwLock<Slot>> {
        &self.slot
    }

    /// Replace the slot content. Caller holds the table write lock.
    pub(crate) fn install(&self, slot: Slot) {
        let mut guard = self.slot.write();
        let state = match &slot {
            Slot::Resident(bytes) => {
                self.size.store(bytes.len(), Ordering::Release);
                RESIDENT
            }
            Slot::Dumping => DUMPING,
            Slot::Dumped(_) => DUMPED,
            Slot::Released => RESIDENT,
        };
        *guard = slot;
        self.state.store(state, Ordering::Release);
    }

    /// Move resident bytes out for dumping, leaving `Slot::Dumping`.
    ///
    /// Caller holds the table write lock and the transfer guard.
    pub(crate) fn take_for_dump(&self) -> Option<AlignedBytes> {
        let mut guard = self.slot.write();
        match std::mem::replace(&mut *guard, Slot::Dumping) {
            Slot::Resident(bytes) => {
                self.state.store(DUMPING, Ordering::Release);
                Some(bytes)
            }
            other => {
                *guard = other;
                None
            }
        }
    }

    /// Claim the right to dump this record, unless a dump is in flight.
    pub(crate) fn try_transfer(&self) -> Option<ArcMutexGuard<RawMutex, ()>> {
        self.transfer.try_lock_arc()
    }

    /// Block until the dump in flight, if any, has finished.
    ///
    /// Never called with the table lock held.
    pub(crate) fn wait_for_transfer(&self) {
        drop(self.transfer.lock());
    }

    pub fn info(&self) -> BufferInfo {
        BufferInfo {
            id: self.id,
            size: self.size(),
            residency: self.residency(),
            lock_count: self.lock_count(),
            last_access: self.last_access(),
        }
    }
}

impl fmt::Debug for BufferRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferRecord")
            .field("id", &self.id)
            .field("size", &self.size())
            .field("residency", &self.residency())
            .field("lock_count", &self.lock_count())
            .finish()
    }
}
