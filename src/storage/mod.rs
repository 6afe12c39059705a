//! Storage layer - temporary files and dump I/O.
//!
//! This module handles everything that touches the filesystem:
//! - [`TempStore`] - Unique temp paths under a self-cleaning root
//! - [`DumpFile`] - Buffer contents written out while evicted

mod dump;
mod temp_store;

pub use dump::DumpFile;
pub use temp_store::{OpenMode, TempDir, TempFile, TempStore};
