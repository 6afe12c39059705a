//! Row-major strided layout.
//!
//! # Strides
//! ```text
//! extents = [4, 3], element = u16, components = 1
//!
//!   dim 0 →   0    2    4    6        strides[0] = 2        (element size)
//!   dim 1 ↓   8   10   12   14        strides[1] = 2 * 4 = 8
//!            16   18   20   22
//!
//! size_in_bytes = strides[1] * extents[1] = 24
//! ```
//! The first dimension varies fastest. Every stride is a multiple of the
//! element size, so every element offset is too.

use super::ElementType;
use crate::common::{CacheError, Result};

/// Shape, element type and strides of an array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    element_type: ElementType,
    num_components: usize,
    extents: Vec<usize>,
    strides: Vec<usize>,
    size_in_bytes: usize,
}

impl Layout {
    /// Compute strides and size for `extents`.
    ///
    /// `num_components` of 0 is treated as 1.
    ///
    /// # Errors
    /// `CacheError::Allocation` if the size overflows `usize`.
    pub fn new(extents: &[usize], element_type: ElementType, num_components: usize) -> Result<Self> {
        let num_components = num_components.max(1);
        let overflow = || CacheError::Allocation {
            requested: usize::MAX,
        };

        let mut strides = Vec::with_capacity(extents.len());
        let mut stride = element_type
            .size()
            .checked_mul(num_components)
            .ok_or_else(overflow)?;
        for &extent in extents {
            strides.push(stride);
            stride = stride.checked_mul(extent).ok_or_else(overflow)?;
        }

        // The running product already is strides.last * extents.last.
        let size_in_bytes = if extents.is_empty() { 0 } else { stride };

        Ok(Self {
            element_type,
            num_components,
            extents: extents.to_vec(),
            strides,
            size_in_bytes,
        })
    }

    #[inline]
    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    #[inline]
    pub fn element_size(&self) -> usize {
        self.element_type.size()
    }

    #[inline]
    pub fn num_components(&self) -> usize {
        self.num_components
    }

    #[inline]
    pub fn num_dimensions(&self) -> usize {
        self.extents.len()
    }

    #[inline]
    pub fn extents(&self) -> &[usize] {
        &self.extents
    }

    #[inline]
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Bytes covered by the extents.
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.size_in_bytes
    }

    /// Number of scalar elements, components included.
    #[inline]
    pub fn num_elements(&self) -> usize {
        self.size_in_bytes / self.element_size()
    }

    /// Byte offset of the element at `indices`.
    ///
    /// # Errors
    /// - `CacheError::DimensionMismatch` if `indices` has the wrong length
    /// - `CacheError::OutOfBounds` if any index reaches its extent
    pub fn offset(&self, indices: &[usize]) -> Result<usize> {
        if indices.len() != self.extents.len() {
            return Err(CacheError::DimensionMismatch {
                expected: self.extents.len(),
                actual: indices.len(),
            });
        }

        let mut offset = 0;
        for (dimension, ((&index, &extent), &stride)) in indices
            .iter()
            .zip(&self.extents)
            .zip(&self.strides)
            .enumerate()
        {
            if index >= extent {
                return Err(CacheError::OutOfBounds {
                    dimension,
                    index,
                    extent,
                });
            }
            offset += index * stride;
        }
        Ok(offset)
    }

    /// Position of the element at `indices` in element units.
    pub fn linear_index(&self, indices: &[usize]) -> Result<usize> {
        Ok(self.offset(indices)? / self.element_size())
    }
}

impl Default for Layout {
    /// No dimensions, one `u8` component, zero bytes.
    fn default() -> Self {
        Self {
            element_type: ElementType::default(),
            num_components: 1,
            extents: Vec::new(),
            strides: Vec::new(),
            size_in_bytes: 0,
        }
    }
}
