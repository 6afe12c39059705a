//! Scoped access to an array's elements.
//!
//! - [`ArrayLock`] - Shared access; many may coexist
//! - [`ArrayLockMut`] - Exclusive access through `&mut Array`
//!
//! Both keep the underlying buffer resident for their whole lifetime.

use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::{ArcRwLockReadGuard, ArcRwLockWriteGuard, RawRwLock};

use super::element::{cast_slice, cast_slice_mut, check_type};
use super::{Element, ElementIter, Layout};
use crate::buffer::{ScopedLock, Slot};
use crate::common::{BufferId, CacheError, Result};

pub(crate) enum SharedBytes<'a> {
    Managed {
        // Declared before `lock` so the guard drops before the unpin.
        guard: ArcRwLockReadGuard<RawRwLock, Slot>,
        lock: ScopedLock,
    },
    Borrowed {
        bytes: &'a [u8],
        _pin: BorrowPin<'a>,
    },
}

pub(crate) enum ExclusiveBytes<'a> {
    Managed {
        guard: ArcRwLockWriteGuard<RawRwLock, Slot>,
        lock: ScopedLock,
    },
    Borrowed(&'a mut [u8]),
}

/// Lock count for arrays over caller memory, which have no buffer record.
pub(crate) struct BorrowPin<'a>(&'a AtomicU32);

impl<'a> BorrowPin<'a> {
    pub(crate) fn new(count: &'a AtomicU32) -> Self {
        count.fetch_add(1, Ordering::AcqRel);
        Self(count)
    }
}

impl Drop for BorrowPin<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

fn element<'s, T: Element>(elements: &'s [T], linear: usize, layout: &Layout) -> Result<&'s T> {
    elements.get(linear).ok_or(CacheError::BufferTooSmall {
        required: layout.size_in_bytes(),
        actual: elements.len() * layout.element_size(),
    })
}

/// Shared, typed access to a locked array.
///
/// Obtained from [`Array::lock`](super::Array::lock).
pub struct ArrayLock<'a> {
    layout: &'a Layout,
    bytes: SharedBytes<'a>,
}

impl<'a> ArrayLock<'a> {
    pub(crate) fn new(layout: &'a Layout, bytes: SharedBytes<'a>) -> Self {
        Self { layout, bytes }
    }

    #[inline]
    pub fn layout(&self) -> &Layout {
        self.layout
    }

    /// Handle of the managed buffer, `None` for views over caller memory.
    pub fn buffer_id(&self) -> Option<BufferId> {
        match &self.bytes {
            SharedBytes::Managed { lock, .. } => Some(lock.id()),
            SharedBytes::Borrowed { .. } => None,
        }
    }

    /// The bytes covered by the layout.
    pub fn as_bytes(&self) -> &[u8] {
        let bytes = match &self.bytes {
            SharedBytes::Managed { guard, .. } => guard.bytes().unwrap_or_default(),
            SharedBytes::Borrowed { bytes, .. } => *bytes,
        };
        &bytes[..self.layout.size_in_bytes().min(bytes.len())]
    }

    /// All elements, viewed as `T`.
    pub fn as_slice<T: Element>(&self) -> Result<&[T]> {
        check_type::<T>(self.layout.element_type())?;
        cast_slice(self.as_bytes())
    }

    /// The element at `indices`.
    ///
    /// # Errors
    /// - `CacheError::DimensionMismatch` / `OutOfBounds` for bad indices
    /// - `CacheError::ElementMismatch` if `T` has the wrong size
    pub fn at<T: Element>(&self, indices: &[usize]) -> Result<&T> {
        let linear = self.layout.linear_index(indices)?;
        element(self.as_slice::<T>()?, linear, self.layout)
    }

    pub fn linear_index(&self, indices: &[usize]) -> Result<usize> {
        self.layout.linear_index(indices)
    }

    pub fn begin<T: Element>(&self) -> Result<ElementIter<'_, T>> {
        Ok(ElementIter::begin(self.as_slice()?))
    }

    pub fn end<T: Element>(&self) -> Result<ElementIter<'_, T>> {
        Ok(ElementIter::end(self.as_slice()?))
    }

    /// Same as [`begin`](Self::begin).
    pub fn iter<T: Element>(&self) -> Result<ElementIter<'_, T>> {
        self.begin()
    }
}

impl std::fmt::Debug for ArrayLock<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArrayLock")
            .field("buffer", &self.buffer_id())
            .field("extents", &self.layout.extents())
            .finish()
    }
}

/// Exclusive, typed access to a locked array.
///
/// Obtained from [`Array::lock_mut`](super::Array::lock_mut).
pub struct ArrayLockMut<'a> {
    layout: &'a Layout,
    bytes: ExclusiveBytes<'a>,
}

impl<'a> ArrayLockMut<'a> {
    pub(crate) fn new(layout: &'a Layout, bytes: ExclusiveBytes<'a>) -> Self {
        Self { layout, bytes }
    }

    #[inline]
    pub fn layout(&self) -> &Layout {
        self.layout
    }

    pub fn buffer_id(&self) -> Option<BufferId> {
        match &self.bytes {
            ExclusiveBytes::Managed { lock, .. } => Some(lock.id()),
            ExclusiveBytes::Borrowed(_) => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        let bytes = match &self.bytes {
            ExclusiveBytes::Managed { guard, .. } => guard.bytes().unwrap_or_default(),
            ExclusiveBytes::Borrowed(bytes) => &**bytes,
        };
        &bytes[..self.layout.size_in_bytes().min(bytes.len())]
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        let size = self.layout.size_in_bytes();
        let bytes = match &mut self.bytes {
            ExclusiveBytes::Managed { guard, .. } => guard.bytes_mut().unwrap_or_default(),
            ExclusiveBytes::Borrowed(bytes) => &mut **bytes,
        };
        let len = size.min(bytes.len());
        &mut bytes[..len]
    }

    pub fn as_slice<T: Element>(&self) -> Result<&[T]> {
        check_type::<T>(self.layout.element_type())?;
        cast_slice(self.as_bytes())
    }

    pub fn as_mut_slice<T: Element>(&mut self) -> Result<&mut [T]> {
        check_type::<T>(self.layout.element_type())?;
        cast_slice_mut(self.as_bytes_mut())
    }

    pub fn at<T: Element>(&self, indices: &[usize]) -> Result<&T> {
        let linear = self.layout.linear_index(indices)?;
        element(self.as_slice::<T>()?, linear, self.layout)
    }

    /// Mutable element at `indices`.
    pub fn at_mut<T: Element>(&mut self, indices: &[usize]) -> Result<&mut T> {
        let linear = self.layout.linear_index(indices)?;
        let layout = self.layout;
        let elements = self.as_mut_slice::<T>()?;
        let available = elements.len();
        elements.get_mut(linear).ok_or(CacheError::BufferTooSmall {
            required: layout.size_in_bytes(),
            actual: available * layout.element_size(),
        })
    }

    pub fn linear_index(&self, indices: &[usize]) -> Result<usize> {
        self.layout.linear_index(indices)
    }

    pub fn iter<T: Element>(&self) -> Result<ElementIter<'_, T>> {
        Ok(ElementIter::begin(self.as_slice()?))
    }

    pub fn iter_mut<T: Element>(&mut self) -> Result<std::slice::IterMut<'_, T>> {
        Ok(self.as_mut_slice()?.iter_mut())
    }
}

impl std::fmt::Debug for ArrayLockMut<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArrayLockMut")
            .field("buffer", &self.buffer_id())
            .field("extents", &self.layout.extents())
            .finish()
    }
}
