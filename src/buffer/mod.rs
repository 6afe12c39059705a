//! Buffer residency management.
//!
//! The buffer manager owns large byte buffers on behalf of arrays and moves
//! them between memory and temporary files as the active eviction policy
//! decides.
//!
//! # Components
//! - [`BufferManager`] - The residency cache
//! - [`BufferRecord`] - One registered buffer plus its metadata
//! - [`ScopedLock`] - RAII guard keeping a buffer resident
//! - [`CacheStatistics`] / [`ManagerStats`] - Sizes and counters
//! - [`policy`] - Eviction policy implementations

mod buffer_manager;
mod bytes;
mod lock_guard;
pub mod policy;
mod record;
mod stats;

pub use buffer_manager::BufferManager;
pub use bytes::AlignedBytes;
pub use lock_guard::{BufferReadGuard, BufferWriteGuard, ScopedLock};
pub use policy::{EvictionPolicy, PolicyRegistry};
pub use record::{BufferInfo, BufferRecord, Residency};
pub use stats::{CacheStatistics, ManagerStats, StatsSnapshot};

pub(crate) use record::Slot;
