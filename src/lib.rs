//! Residency - a buffer cache that parks large buffers on disk.
//!
//! Large voxel buffers are registered with a [`BufferManager`]. An eviction
//! policy chosen at runtime decides which unlocked buffers are written to
//! temporary files ("dumped"); locking a dumped buffer reads it back
//! ("restores") before handing out access.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           Residency                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                Array Layer (array/)                      │   │
//! │  │     Array + Layout + ArrayLock + ElementIter             │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │          Buffer Manager (buffer/)  [Runtime Swappable]   │   │
//! │  │   ┌─────────────────────────────────────────────────┐   │   │
//! │  │   │  Eviction Policies: never | always | threshold  │   │   │
//! │  │   │         | barrier | custom (by registry name)   │   │   │
//! │  │   └─────────────────────────────────────────────────┘   │   │
//! │  │   BufferManager + BufferRecord + ScopedLock + Stats      │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │            ↓                                   ↓                │
//! │  ┌────────────────────────────┐  ┌─────────────────────────┐   │
//! │  │   Storage Layer (storage/) │  │  Notifications (notify/) │   │
//! │  │   TempStore + DumpFile     │  │  CacheEvent fan-out      │   │
//! │  └────────────────────────────┘  └─────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (BufferId, ByteSize, CacheError, config)
//! - [`storage`] - Temporary files and dump I/O
//! - [`buffer`] - Buffer manager and eviction policies
//! - [`array`] - Strided typed arrays on top of managed buffers
//! - [`notify`] - Events for cache observers
//!
//! # Quick Start
//! ```
//! use std::sync::Arc;
//! use residency::{Array, BufferManager, ElementType, ManagerConfig};
//!
//! let config = ManagerConfig::default()
//!     .with_policy("threshold")
//!     .with_param("ceiling", "0");
//! let manager = Arc::new(BufferManager::with_config(config).unwrap());
//!
//! // Registering pushes resident bytes over the ceiling: the buffer is dumped.
//! let array = Array::with_layout(Arc::clone(&manager), &[1000], ElementType::U32, 1).unwrap();
//! assert_eq!(manager.compute_statistics().total_dumped, 4000);
//!
//! // Locking brings it back.
//! let lock = array.lock().unwrap();
//! assert_eq!(*lock.at::<u32>(&[500]).unwrap(), 0);
//! ```

pub mod array;
pub mod buffer;
pub mod common;
pub mod notify;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::DEFAULT_POLICY;
pub use common::{BufferId, ByteSize, CacheError, ManagerConfig, Result};

pub use array::{Array, ArrayLock, ArrayLockMut, Element, ElementIter, ElementType, ExternalBuffer, Layout};
pub use buffer::policy::{AlwaysDump, BarrierDump, NeverDump, ThresholdDump};
pub use buffer::{
    BufferInfo, BufferManager, CacheStatistics, EvictionPolicy, PolicyRegistry, Residency,
    ScopedLock, StatsSnapshot,
};
pub use notify::{CacheEvent, NotificationChannel, RegistryChange};
pub use storage::TempStore;
