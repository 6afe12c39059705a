//! Common types and utilities shared across the cache.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants and [`ManagerConfig`]
//! - Error types
//! - Identifiers ([`BufferId`]) and the access clock
//! - Human-readable byte sizes

mod buffer_id;
mod byte_size;
mod clock;
pub mod config;
pub mod error;

pub use buffer_id::BufferId;
pub use byte_size::ByteSize;
pub use clock::LogicalClock;
pub use config::ManagerConfig;
pub use error::{CacheError, Result};
