//! Word-aligned byte allocations.

use crate::common::{CacheError, Result};

/// A heap byte buffer whose start is aligned to 8 bytes.
///
/// Backed by `u64` words so typed access to any primitive element type is
/// aligned as long as the offset is a multiple of the element size.
pub struct AlignedBytes {
    words: Box<[u64]>,
    len: usize,
}

impl AlignedBytes {
    /// Allocate `len` zeroed bytes.
    ///
    /// # Errors
    /// `CacheError::Allocation` if the allocator refuses the request.
    pub fn zeroed(len: usize) -> Result<Self> {
        let word_count = len.div_ceil(8);
        let mut words: Vec<u64> = Vec::new();
        words
            .try_reserve_exact(word_count)
            .map_err(|_| CacheError::Allocation { requested: len })?;
        words.resize(word_count, 0);

        Ok(Self {
            words: words.into_boxed_slice(),
            len,
        })
    }

    /// Allocate a copy of `bytes`.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let mut aligned = Self::zeroed(bytes.len())?;
        aligned.as_mut_slice().copy_from_slice(bytes);
        Ok(aligned)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: `len <= words.len() * 8`, every u64 bit pattern is a valid
        // sequence of initialized bytes, and u8 has alignment 1.
        unsafe { std::slice::from_raw_parts(self.words.as_ptr() as *const u8, self.len) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: as above; the unique borrow of `words` is carried over.
        unsafe { std::slice::from_raw_parts_mut(self.words.as_mut_ptr() as *mut u8, self.len) }
    }
}

impl std::fmt::Debug for AlignedBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedBytes").field("len", &self.len).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed() {
        let bytes = AlignedBytes::zeroed(13).unwrap();
        assert_eq!(bytes.len(), 13);
        assert!(bytes.as_slice().iter().all(|&b| b == 0));
        assert_eq!(bytes.as_slice().as_ptr() as usize % 8, 0);
    }

    #[test]
    fn test_empty() {
        let bytes = AlignedBytes::zeroed(0).unwrap();
        assert!(bytes.is_empty());
        assert!(bytes.as_slice().is_empty());
    }

    #[test]
    fn test_from_slice_copies() {
        let mut bytes = AlignedBytes::from_slice(&[1, 2, 3]).unwrap();
        assert_eq!(bytes.as_slice(), &[1, 2, 3]);
        bytes.as_mut_slice()[1] = 9;
        assert_eq!(bytes.as_slice(), &[1, 9, 3]);
    }

    #[test]
    fn test_huge_allocation_fails() {
        let result = AlignedBytes::zeroed(usize::MAX);
        assert!(matches!(result, Err(CacheError::Allocation { .. })));
    }
}
