//! Element types an array can hold.

use std::fmt;
use std::mem::{align_of, size_of};

use crate::common::{CacheError, Result};

/// Scalar type of one array component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ElementType {
    #[default]
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

impl ElementType {
    /// Size in bytes.
    pub const fn size(self) -> usize {
        match self {
            ElementType::U8 | ElementType::I8 => 1,
            ElementType::U16 | ElementType::I16 => 2,
            ElementType::U32 | ElementType::I32 | ElementType::F32 => 4,
            ElementType::U64 | ElementType::I64 | ElementType::F64 => 8,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ElementType::U8 => "u8",
            ElementType::I8 => "i8",
            ElementType::U16 => "u16",
            ElementType::I16 => "i16",
            ElementType::U32 => "u32",
            ElementType::I32 => "i32",
            ElementType::U64 => "u64",
            ElementType::I64 => "i64",
            ElementType::F32 => "f32",
            ElementType::F64 => "f64",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A primitive that can be read from and written to array bytes.
///
/// Sealed: every implementor is a plain integer or float for which each bit
/// pattern is a valid value, which is what makes the byte casts below sound.
pub trait Element: sealed::Sealed + Copy + Default + fmt::Debug + Send + Sync + 'static {
    const TYPE: ElementType;
}

macro_rules! impl_element {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}
            impl Element for $ty {
                const TYPE: ElementType = ElementType::$variant;
            }
        )*
    };
}

impl_element! {
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    u64 => U64,
    i64 => I64,
    f32 => F32,
    f64 => F64,
}

/// Check that `T` may stand in for elements of type `stored`.
///
/// Only the size has to match; reading `u32` data as `f32` reinterprets.
pub(crate) fn check_type<T: Element>(stored: ElementType) -> Result<()> {
    if size_of::<T>() == stored.size() {
        Ok(())
    } else {
        Err(CacheError::ElementMismatch {
            expected: stored.name(),
            actual: T::TYPE.name(),
        })
    }
}

fn check_cast<T: Element>(bytes: &[u8]) -> Result<()> {
    if bytes.len() % size_of::<T>() != 0 {
        return Err(CacheError::BufferTooSmall {
            required: bytes.len().next_multiple_of(size_of::<T>()),
            actual: bytes.len(),
        });
    }
    if bytes.as_ptr().align_offset(align_of::<T>()) != 0 {
        return Err(CacheError::Misaligned {
            align: align_of::<T>(),
        });
    }
    Ok(())
}

/// View `bytes` as a slice of `T`.
pub(crate) fn cast_slice<T: Element>(bytes: &[u8]) -> Result<&[T]> {
    check_cast::<T>(bytes)?;
    // SAFETY: length is a multiple of size_of::<T>(), the start is aligned,
    // and every bit pattern is a valid T (sealed trait).
    Ok(unsafe {
        std::slice::from_raw_parts(bytes.as_ptr() as *const T, bytes.len() / size_of::<T>())
    })
}

/// View `bytes` as a mutable slice of `T`.
pub(crate) fn cast_slice_mut<T: Element>(bytes: &mut [u8]) -> Result<&mut [T]> {
    check_cast::<T>(bytes)?;
    // SAFETY: as in `cast_slice`; the unique borrow of `bytes` is carried
    // over, and any T written back is a valid byte sequence.
    Ok(unsafe {
        std::slice::from_raw_parts_mut(bytes.as_mut_ptr() as *mut T, bytes.len() / size_of::<T>())
    })
}
