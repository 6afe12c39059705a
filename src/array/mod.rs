//! Strided N-dimensional arrays.
//!
//! An [`Array`] describes its bytes with a row-major [`Layout`] and keeps
//! them either in the [`BufferManager`](crate::BufferManager) (owned,
//! dumpable) or in caller memory (borrowed, never dumped).
//!
//! # Components
//! - [`Array`] - Owning or borrowing typed view
//! - [`Layout`] - Extents, strides and element type
//! - [`ArrayLock`] / [`ArrayLockMut`] - Scoped element access
//! - [`ElementIter`] - Clamped forward cursor over typed elements
//! - [`Element`] / [`ElementType`] - Supported scalar types

#[allow(clippy::module_inception)]
mod array;
mod element;
mod iter;
mod layout;
mod lock;

pub use array::{Array, ExternalBuffer};
pub use element::{Element, ElementType};
pub use iter::ElementIter;
pub use layout::Layout;
pub use lock::{ArrayLock, ArrayLockMut};
