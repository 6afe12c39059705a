//! RAII guards for buffer access.
//!
//! - [`ScopedLock`] - Keeps a buffer resident (increments its lock count)
//! - [`BufferReadGuard`] - Shared access to the locked bytes
//! - [`BufferWriteGuard`] - Exclusive access to the locked bytes
//!
//! The lock count only protects residency: while it is non-zero the buffer
//! cannot be dumped. Data races between holders are ruled out separately by
//! the per-buffer `RwLock` the byte guards take.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::{
    ArcRwLockReadGuard, ArcRwLockWriteGuard, RawRwLock, RwLockReadGuard, RwLockWriteGuard,
};

use crate::buffer::record::{BufferRecord, Slot};
use crate::common::BufferId;

/// Guard that keeps a buffer resident.
///
/// Obtained from [`BufferManager::lock`](crate::BufferManager::lock). Any
/// number of `ScopedLock`s may exist for one buffer; the buffer may be dumped
/// again once the last one is dropped.
///
/// # Example
/// ```ignore
/// let lock = manager.lock(id)?;
/// lock.write()[0] = 0xAB;
/// assert_eq!(lock.read()[0], 0xAB);
/// // lock drops here, lock count decremented
/// ```
pub struct ScopedLock {
    record: Arc<BufferRecord>,
}

impl ScopedLock {
    /// Wrap a record that the manager has already pinned.
    pub(crate) fn new(record: Arc<BufferRecord>) -> Self {
        Self { record }
    }

    #[inline]
    pub fn id(&self) -> BufferId {
        self.record.id()
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.record.size()
    }

    #[inline]
    pub fn lock_count(&self) -> u32 {
        self.record.lock_count()
    }

    /// Shared access to the bytes. Blocks while a write guard is alive.
    pub fn read(&self) -> BufferReadGuard<'_> {
        BufferReadGuard {
            guard: self.record.slot().read(),
        }
    }

    /// Exclusive access to the bytes. Blocks while other guards are alive.
    pub fn write(&self) -> BufferWriteGuard<'_> {
        BufferWriteGuard {
            guard: self.record.slot().write(),
        }
    }

    /// Owned shared guard, for holders that keep the lock next to the guard.
    pub(crate) fn read_arc(&self) -> ArcRwLockReadGuard<RawRwLock, Slot> {
        self.record.slot().read_arc()
    }

    /// Owned exclusive guard, for holders that keep the lock next to the guard.
    pub(crate) fn write_arc(&self) -> ArcRwLockWriteGuard<RawRwLock, Slot> {
        self.record.slot().write_arc()
    }
}

impl Clone for ScopedLock {
    /// Another lock on the same buffer.
    fn clone(&self) -> Self {
        self.record.pin();
        Self {
            record: Arc::clone(&self.record),
        }
    }
}

impl Drop for ScopedLock {
    fn drop(&mut self) {
        self.record.unpin();
    }
}

impl fmt::Debug for ScopedLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedLock")
            .field("id", &self.id())
            .field("lock_count", &self.record.lock_count())
            .finish()
    }
}

/// Shared view of a locked buffer's bytes.
pub struct BufferReadGuard<'a> {
    guard: RwLockReadGuard<'a, Slot>,
}

impl Deref for BufferReadGuard<'_> {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        // A locked buffer is always resident.
        self.guard.bytes().unwrap_or_default()
    }
}

/// Exclusive view of a locked buffer's bytes.
pub struct BufferWriteGuard<'a> {
    guard: RwLockWriteGuard<'a, Slot>,
}

impl Deref for BufferWriteGuard<'_> {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        self.guard.bytes().unwrap_or_default()
    }
}

impl DerefMut for BufferWriteGuard<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [u8] {
        self.guard.bytes_mut().unwrap_or_default()
    }
}
