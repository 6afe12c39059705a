//! Strided, typed arrays over managed or caller-provided bytes.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use super::element::check_type;
use super::lock::{BorrowPin, ExclusiveBytes, SharedBytes};
use super::{ArrayLock, ArrayLockMut, Element, ElementType, Layout};
use crate::buffer::BufferManager;
use crate::common::{BufferId, CacheError, Result};

/// Bytes handed to [`Array::set_external_buffer`].
#[derive(Debug)]
pub enum ExternalBuffer<'a> {
    /// Adopted: registered with the manager and dumpable like any buffer
    /// the array allocated itself.
    Owned(Vec<u8>),

    /// Viewed in place: never registered, never dumped.
    Borrowed(&'a mut [u8]),
}

/// Where an array's bytes live.
#[derive(Debug)]
enum Storage<'a> {
    Empty,
    Managed { id: BufferId, allocated: usize },
    Borrowed(&'a mut [u8]),
}

/// An N-dimensional array of fixed-size elements.
///
/// Owned arrays keep their bytes in a [`BufferManager`], so the bytes may be
/// dumped to disk whenever no lock is held. Reading or writing elements
/// therefore goes through [`lock`](Self::lock) / [`lock_mut`](Self::lock_mut),
/// which restore the buffer if needed and keep it resident.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use residency::{Array, BufferManager, ElementType};
///
/// let manager = Arc::new(BufferManager::new());
/// let mut array = Array::with_layout(manager, &[10, 100], ElementType::U32, 1).unwrap();
///
/// {
///     let mut lock = array.lock_mut().unwrap();
///     *lock.at_mut::<u32>(&[3, 7]).unwrap() = 42;
/// }
///
/// let lock = array.lock().unwrap();
/// assert_eq!(*lock.at::<u32>(&[3, 7]).unwrap(), 42);
/// assert_eq!(array.at::<u32>(&[3, 7]).unwrap(), 42);
/// ```
pub struct Array<'a> {
    manager: Arc<BufferManager>,
    layout: Layout,
    storage: Storage<'a>,
    /// Outstanding locks on a borrowed buffer.
    borrowed_locks: AtomicU32,
}

impl<'a> Array<'a> {
    /// An empty array with no dimensions and no storage.
    pub fn new(manager: Arc<BufferManager>) -> Self {
        Self {
            manager,
            layout: Layout::default(),
            storage: Storage::Empty,
            borrowed_locks: AtomicU32::new(0),
        }
    }

    /// An array with freshly allocated, zeroed storage.
    pub fn with_layout(
        manager: Arc<BufferManager>,
        extents: &[usize],
        element_type: ElementType,
        num_components: usize,
    ) -> Result<Self> {
        let mut array = Self::new(manager);
        array.resize(extents, element_type, num_components, true)?;
        Ok(array)
    }

    // ========================================================================
    // Layout
    // ========================================================================

    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    #[inline]
    pub fn extents(&self) -> &[usize] {
        self.layout.extents()
    }

    #[inline]
    pub fn strides(&self) -> &[usize] {
        self.layout.strides()
    }

    #[inline]
    pub fn element_type(&self) -> ElementType {
        self.layout.element_type()
    }

    #[inline]
    pub fn element_size(&self) -> usize {
        self.layout.element_size()
    }

    #[inline]
    pub fn num_components(&self) -> usize {
        self.layout.num_components()
    }

    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.layout.size_in_bytes()
    }

    #[inline]
    pub fn num_elements(&self) -> usize {
        self.layout.num_elements()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layout.size_in_bytes() == 0
    }

    /// Bytes of storage behind the array; may exceed `size_in_bytes`.
    pub fn allocated_size(&self) -> usize {
        match &self.storage {
            Storage::Empty => 0,
            Storage::Managed { allocated, .. } => *allocated,
            Storage::Borrowed(bytes) => bytes.len(),
        }
    }

    /// Whether the array owns its bytes (and may therefore be dumped).
    pub fn is_buffer_owner(&self) -> bool {
        matches!(self.storage, Storage::Managed { .. })
    }

    pub fn buffer_id(&self) -> Option<BufferId> {
        match self.storage {
            Storage::Managed { id, .. } => Some(id),
            _ => None,
        }
    }

    pub fn manager(&self) -> &Arc<BufferManager> {
        &self.manager
    }

    // ========================================================================
    // Storage
    // ========================================================================

    /// Change shape and element type. Returns the allocated size in bytes.
    ///
    /// Without `reallocate`, a layout that fits the current storage only
    /// reinterprets it: no bytes are copied or cleared, so bytes left over
    /// from a larger layout show up again when growing back. Otherwise the
    /// storage is replaced by a zeroed allocation of exactly the new size
    /// (none at all for an empty layout).
    ///
    /// # Errors
    /// - `CacheError::Allocation` if memory cannot be obtained; the array is
    ///   unchanged
    /// - `CacheError::BufferLocked` if someone else holds a lock on the buffer
    pub fn resize(
        &mut self,
        extents: &[usize],
        element_type: ElementType,
        num_components: usize,
        reallocate: bool,
    ) -> Result<usize> {
        let layout = Layout::new(extents, element_type, num_components)?;
        let size = layout.size_in_bytes();

        if !reallocate && size <= self.allocated_size() {
            debug!(?extents, size, "reinterpreting array storage");
            self.layout = layout;
            return Ok(self.allocated_size());
        }

        if size == 0 {
            self.release();
            self.layout = layout;
            return Ok(0);
        }

        match self.storage {
            Storage::Managed { id, .. } => {
                self.manager.reallocate(id, size)?;
                self.storage = Storage::Managed {
                    id,
                    allocated: size,
                };
            }
            Storage::Empty | Storage::Borrowed(_) => {
                let id = self.manager.register(size)?;
                self.storage = Storage::Managed {
                    id,
                    allocated: size,
                };
            }
        }

        self.layout = layout;
        Ok(size)
    }

    /// Use caller-provided bytes as storage.
    ///
    /// The previous storage is released.
    ///
    /// # Errors
    /// - `CacheError::BufferTooSmall` if the layout needs more bytes
    /// - `CacheError::Allocation` if an owned buffer cannot be registered
    pub fn set_external_buffer(
        &mut self,
        buffer: ExternalBuffer<'a>,
        extents: &[usize],
        element_type: ElementType,
        num_components: usize,
    ) -> Result<()> {
        let layout = Layout::new(extents, element_type, num_components)?;
        let actual = match &buffer {
            ExternalBuffer::Owned(bytes) => bytes.len(),
            ExternalBuffer::Borrowed(bytes) => bytes.len(),
        };
        if actual < layout.size_in_bytes() {
            return Err(CacheError::BufferTooSmall {
                required: layout.size_in_bytes(),
                actual,
            });
        }

        let storage = match buffer {
            ExternalBuffer::Owned(bytes) => Storage::Managed {
                id: self.manager.register_bytes(&bytes)?,
                allocated: bytes.len(),
            },
            ExternalBuffer::Borrowed(bytes) => Storage::Borrowed(bytes),
        };

        self.release();
        self.storage = storage;
        self.layout = layout;
        Ok(())
    }

    /// Drop the storage, keeping the layout's element type.
    fn release(&mut self) {
        let storage = std::mem::replace(&mut self.storage, Storage::Empty);
        if let Storage::Managed { id, .. } = storage {
            if let Err(e) = self.manager.unregister(id) {
                warn!(%id, error = %e, "failed to release array buffer");
            }
        }
    }

    // ========================================================================
    // Access
    // ========================================================================

    /// Lock for shared access, restoring the buffer if it was dumped.
    pub fn lock(&self) -> Result<ArrayLock<'_>> {
        let bytes = match &self.storage {
            Storage::Managed { id, .. } => {
                let lock = self.manager.lock(*id)?;
                SharedBytes::Managed {
                    guard: lock.read_arc(),
                    lock,
                }
            }
            Storage::Borrowed(bytes) => SharedBytes::Borrowed {
                bytes: &**bytes,
                _pin: BorrowPin::new(&self.borrowed_locks),
            },
            Storage::Empty => SharedBytes::Borrowed {
                bytes: &[],
                _pin: BorrowPin::new(&self.borrowed_locks),
            },
        };
        Ok(ArrayLock::new(&self.layout, bytes))
    }

    /// Lock for exclusive access, restoring the buffer if it was dumped.
    pub fn lock_mut(&mut self) -> Result<ArrayLockMut<'_>> {
        let bytes = match &mut self.storage {
            Storage::Managed { id, .. } => {
                let lock = self.manager.lock(*id)?;
                ExclusiveBytes::Managed {
                    guard: lock.write_arc(),
                    lock,
                }
            }
            Storage::Borrowed(bytes) => ExclusiveBytes::Borrowed(&mut **bytes),
            Storage::Empty => ExclusiveBytes::Borrowed(&mut []),
        };
        Ok(ArrayLockMut::new(&self.layout, bytes))
    }

    /// Whether any lock on the array's bytes is outstanding.
    pub fn is_locked(&self) -> Result<bool> {
        match self.storage {
            Storage::Managed { id, .. } => Ok(self.manager.lock_count(id)? > 0),
            _ => Ok(self.borrowed_locks.load(Ordering::Acquire) > 0),
        }
    }

    /// Copy of the element at `indices`.
    ///
    /// Only valid while a lock is held, so the buffer cannot be dumped
    /// underneath the read.
    ///
    /// # Errors
    /// - `CacheError::NotLocked` if no lock is held
    /// - `CacheError::DimensionMismatch` / `OutOfBounds` for bad indices
    /// - `CacheError::ElementMismatch` if `T` has the wrong size
    pub fn at<T: Element>(&self, indices: &[usize]) -> Result<T> {
        check_type::<T>(self.layout.element_type())?;
        let offset = self.layout.offset(indices)?;

        match &self.storage {
            Storage::Managed { id, .. } => {
                let record = self.manager.record(*id)?;
                // A dump needs the slot exclusively, so the count cannot drop
                // to a dump while this guard is held.
                let slot = record.slot().read_recursive();
                if !record.is_locked() {
                    return Err(CacheError::NotLocked);
                }
                read_element(slot.bytes().ok_or(CacheError::NotLocked)?, offset)
            }
            Storage::Borrowed(bytes) => {
                if self.borrowed_locks.load(Ordering::Acquire) == 0 {
                    return Err(CacheError::NotLocked);
                }
                read_element(bytes, offset)
            }
            Storage::Empty => Err(CacheError::NotLocked),
        }
    }

    /// Byte offset of the element at `indices`.
    pub fn offset(&self, indices: &[usize]) -> Result<usize> {
        self.layout.offset(indices)
    }
}

fn read_element<T: Element>(bytes: &[u8], offset: usize) -> Result<T> {
    let end = offset + std::mem::size_of::<T>();
    let bytes = bytes.get(offset..end).ok_or(CacheError::BufferTooSmall {
        required: end,
        actual: bytes.len(),
    })?;
    Ok(super::element::cast_slice::<T>(bytes)?[0])
}

impl Drop for Array<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Array<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Array")
            .field("layout", &self.layout)
            .field("storage", &self.storage)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ManagerConfig;
    use tempfile::tempdir;

    fn create_test_manager() -> (Arc<BufferManager>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let config = ManagerConfig::default().with_temp_parent(dir.path());
        (Arc::new(BufferManager::with_config(config).unwrap()), dir)
    }

    fn fill_linear(array: &mut Array<'_>) {
        let mut lock = array.lock_mut().unwrap();
        for (i, value) in lock.iter_mut::<u32>().unwrap().enumerate() {
            *value = i as u32;
        }
    }

    #[test]
    fn test_with_layout_registers_zeroed_buffer() {
        let (manager, _dir) = create_test_manager();
        let array = Array::with_layout(Arc::clone(&manager), &[10, 100], ElementType::U32, 1).unwrap();

        assert_eq!(array.size_in_bytes(), 4000);
        assert_eq!(array.allocated_size(), 4000);
        assert_eq!(array.strides(), &[4, 40]);
        assert!(array.is_buffer_owner());
        assert_eq!(manager.buffer_count(), 1);

        let lock = array.lock().unwrap();
        assert!(lock.iter::<u32>().unwrap().all(|&v| v == 0));
    }

    #[test]
    fn test_resize_reinterprets_in_place() {
        let (manager, _dir) = create_test_manager();
        let mut array = Array::with_layout(manager, &[10, 100], ElementType::U32, 1).unwrap();
        fill_linear(&mut array);

        let before = *array.lock().unwrap().at::<u32>(&[0, 1]).unwrap();
        let id = array.buffer_id();

        let allocated = array.resize(&[100, 10], ElementType::U32, 1, false).unwrap();
        assert_eq!(allocated, 4000);
        assert_eq!(array.strides(), &[4, 400]);
        assert_eq!(array.buffer_id(), id);

        let lock = array.lock().unwrap();
        assert_eq!(before, 10);
        assert_eq!(*lock.at::<u32>(&[10, 0]).unwrap(), before);
    }

    #[test]
    fn test_shrink_then_grow_keeps_stale_bytes() {
        let (manager, _dir) = create_test_manager();
        let mut array = Array::with_layout(manager, &[8], ElementType::U32, 1).unwrap();
        fill_linear(&mut array);

        array.resize(&[2], ElementType::U32, 1, false).unwrap();
        assert_eq!(array.size_in_bytes(), 8);
        assert_eq!(array.allocated_size(), 32);

        array.resize(&[8], ElementType::U32, 1, false).unwrap();
        assert_eq!(*array.lock().unwrap().at::<u32>(&[7]).unwrap(), 7);
    }

    #[test]
    fn test_resize_with_reallocate_zeroes() {
        let (manager, _dir) = create_test_manager();
        let mut array = Array::with_layout(manager, &[8], ElementType::U32, 1).unwrap();
        fill_linear(&mut array);

        assert_eq!(array.resize(&[4], ElementType::U32, 1, true).unwrap(), 16);
        let lock = array.lock().unwrap();
        assert!(lock.iter::<u32>().unwrap().all(|&v| v == 0));
    }

    #[test]
    fn test_grow_beyond_allocation_reallocates() {
        let (manager, _dir) = create_test_manager();
        let mut array = Array::with_layout(manager, &[4], ElementType::U8, 1).unwrap();

        assert_eq!(array.resize(&[4, 4], ElementType::U8, 1, false).unwrap(), 16);
        assert_eq!(array.allocated_size(), 16);
    }

    #[test]
    fn test_resize_to_empty_releases_buffer() {
        let (manager, _dir) = create_test_manager();
        let mut array = Array::with_layout(Arc::clone(&manager), &[4], ElementType::U8, 1).unwrap();

        assert_eq!(array.resize(&[0], ElementType::U8, 1, true).unwrap(), 0);
        assert!(!array.is_buffer_owner());
        assert_eq!(manager.buffer_count(), 0);
    }

    #[test]
    fn test_at_requires_lock() {
        let (manager, _dir) = create_test_manager();
        let mut array = Array::with_layout(manager, &[4], ElementType::U32, 1).unwrap();
        fill_linear(&mut array);

        assert!(matches!(array.at::<u32>(&[2]), Err(CacheError::NotLocked)));

        let lock = array.lock().unwrap();
        assert_eq!(array.at::<u32>(&[2]).unwrap(), 2);
        drop(lock);

        assert!(matches!(array.at::<u32>(&[2]), Err(CacheError::NotLocked)));
    }

    #[test]
    fn test_at_after_unlock_and_dump() {
        let (manager, _dir) = create_test_manager();
        let mut array = Array::with_layout(Arc::clone(&manager), &[4], ElementType::U32, 1).unwrap();
        fill_linear(&mut array);

        drop(array.lock().unwrap());
        manager.dump(array.buffer_id().unwrap()).unwrap();

        assert!(matches!(array.at::<u32>(&[1]), Err(CacheError::NotLocked)));
    }

    /// One thread writes through a lock and registers another buffer while a
    /// second thread reads an element of the locked array.
    #[test]
    fn test_at_while_writer_registers() {
        use std::thread;
        use std::time::Duration;

        let (manager, _dir) = create_test_manager();
        let array = Array::with_layout(Arc::clone(&manager), &[4], ElementType::U32, 1).unwrap();
        let id = array.buffer_id().unwrap();

        let (ready_tx, ready_rx) = crossbeam_channel::bounded(0);
        let (registered_tx, registered_rx) = crossbeam_channel::bounded(1);
        let (value_tx, value_rx) = crossbeam_channel::bounded(1);
        let (release_tx, release_rx) = crossbeam_channel::bounded::<()>(1);

        let writer = {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                let lock = manager.lock(id).unwrap();
                let mut bytes = lock.write();
                bytes[..4].copy_from_slice(&7u32.to_ne_bytes());
                ready_tx.send(()).unwrap();
                thread::sleep(Duration::from_millis(50));
                let other = manager.register(16);
                drop(bytes);
                registered_tx.send(other.is_ok()).unwrap();
                let _ = release_rx.recv();
            })
        };
        let reader = thread::spawn(move || {
            ready_rx.recv().unwrap();
            value_tx.send(array.at::<u32>(&[0]).ok()).unwrap();
            array
        });

        let timeout = Duration::from_secs(5);
        assert_eq!(registered_rx.recv_timeout(timeout), Ok(true));
        assert_eq!(value_rx.recv_timeout(timeout), Ok(Some(7)));

        release_tx.send(()).unwrap();
        writer.join().unwrap();
        drop(reader.join().unwrap());
        assert_eq!(manager.buffer_count(), 1);
    }

    #[test]
    fn test_typed_access_errors() {
        let (manager, _dir) = create_test_manager();
        let array = Array::with_layout(manager, &[4, 4], ElementType::U16, 1).unwrap();
        let lock = array.lock().unwrap();

        assert!(matches!(lock.at::<u32>(&[0, 0]), Err(CacheError::ElementMismatch { .. })));
        assert!(matches!(lock.at::<u16>(&[4, 0]), Err(CacheError::OutOfBounds { .. })));
        assert!(matches!(lock.at::<u16>(&[0]), Err(CacheError::DimensionMismatch { .. })));
        assert!(lock.at::<i16>(&[3, 3]).is_ok());
    }

    #[test]
    fn test_lock_restores_dumped_array() {
        let (manager, _dir) = create_test_manager();
        let mut array = Array::with_layout(Arc::clone(&manager), &[16], ElementType::U32, 1).unwrap();
        fill_linear(&mut array);

        let id = array.buffer_id().unwrap();
        manager.dump(id).unwrap();
        assert!(manager.is_dumped(id).unwrap());

        let lock = array.lock().unwrap();
        assert!(!manager.is_dumped(id).unwrap());
        assert_eq!(*lock.at::<u32>(&[15]).unwrap(), 15);
    }

    #[test]
    fn test_borrowed_buffer_is_never_registered() {
        let (manager, _dir) = create_test_manager();
        let mut words = [0u64; 4];
        // SAFETY: u64 storage reinterpreted as 32 bytes.
        let bytes = unsafe { std::slice::from_raw_parts_mut(words.as_mut_ptr() as *mut u8, 32) };

        {
            let mut array = Array::new(Arc::clone(&manager));
            array
                .set_external_buffer(ExternalBuffer::Borrowed(bytes), &[8], ElementType::U32, 1)
                .unwrap();
            assert!(!array.is_buffer_owner());
            assert_eq!(manager.buffer_count(), 0);

            let mut lock = array.lock_mut().unwrap();
            *lock.at_mut::<u32>(&[1]).unwrap() = 0xDEAD_BEEF;
            drop(lock);

            assert!(matches!(array.at::<u32>(&[1]), Err(CacheError::NotLocked)));
            let _lock = array.lock().unwrap();
            assert_eq!(array.at::<u32>(&[1]).unwrap(), 0xDEAD_BEEF);
        }

        assert_eq!(manager.buffer_count(), 0);
        assert_ne!(words[0], 0);
    }

    #[test]
    fn test_owned_external_buffer_is_adopted() {
        let (manager, _dir) = create_test_manager();
        let mut array = Array::new(Arc::clone(&manager));
        array
            .set_external_buffer(ExternalBuffer::Owned(vec![1, 2, 3, 4]), &[2, 2], ElementType::U8, 1)
            .unwrap();

        assert!(array.is_buffer_owner());
        let id = array.buffer_id().unwrap();
        manager.dump(id).unwrap();
        assert_eq!(*array.lock().unwrap().at::<u8>(&[1, 1]).unwrap(), 4);
    }

    #[test]
    fn test_external_buffer_too_small() {
        let (manager, _dir) = create_test_manager();
        let mut array = Array::new(manager);
        assert!(matches!(
            array.set_external_buffer(ExternalBuffer::Owned(vec![0; 3]), &[4], ElementType::U8, 1),
            Err(CacheError::BufferTooSmall {
                required: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_drop_unregisters() {
        let (manager, _dir) = create_test_manager();
        let array = Array::with_layout(Arc::clone(&manager), &[4], ElementType::U8, 1).unwrap();
        assert_eq!(manager.buffer_count(), 1);

        drop(array);
        assert_eq!(manager.buffer_count(), 0);
    }

    #[test]
    fn test_iterator_covers_all_elements() {
        let (manager, _dir) = create_test_manager();
        let mut array = Array::with_layout(manager, &[3, 5], ElementType::U32, 1).unwrap();
        fill_linear(&mut array);

        let lock = array.lock().unwrap();
        let mut it = lock.begin::<u32>().unwrap();
        let end = lock.end::<u32>().unwrap();

        let mut expected = 0;
        while it != end {
            assert_eq!(it.get(), Some(&expected));
            it += 1;
            expected += 1;
        }
        assert_eq!(expected, 15);
    }

    #[test]
    fn test_empty_array() {
        let (manager, _dir) = create_test_manager();
        let array = Array::new(manager);

        assert!(array.is_empty());
        assert_eq!(array.allocated_size(), 0);
        let lock = array.lock().unwrap();
        assert!(lock.as_bytes().is_empty());
        assert_eq!(lock.begin::<u8>().unwrap(), lock.end::<u8>().unwrap());
    }
}
