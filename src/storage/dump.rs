//! Dump files - raw buffer contents parked on disk.
//!
//! # File Layout
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ byte 0 ............................ size - 1 │   no header, no padding
//! └──────────────────────────────────────────────┘
//! ```
//! The file length always equals the dumped buffer's size. The CRC32 of the
//! content is kept in memory next to the path and checked on restore.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use crate::buffer::AlignedBytes;
use crate::common::config::DUMP_FILE_PREFIX;
use crate::common::Result;
use crate::storage::{OpenMode, TempFile, TempStore};

/// A buffer's content written to a temp file.
///
/// Dropping the `DumpFile` deletes the file.
#[derive(Debug)]
pub struct DumpFile {
    file: TempFile,
    len: usize,
    checksum: u32,
}

impl DumpFile {
    /// Write `bytes` to a new temp file and sync it.
    ///
    /// # Errors
    /// - `CacheError::TempAllocation` if no file name is available
    /// - `CacheError::Io` on write failure (the partial file is removed)
    pub fn write(store: &TempStore, bytes: &[u8]) -> Result<Self> {
        let mut file = store.make_file(DUMP_FILE_PREFIX, OpenMode::Write)?;
        if let Some(handle) = file.file() {
            handle.write_all(bytes)?;
            handle.sync_all()?;
        }
        file.close();

        Ok(Self {
            file,
            len: bytes.len(),
            checksum: crc32fast::hash(bytes),
        })
    }

    /// Read the whole file back into a fresh allocation.
    ///
    /// # Errors
    /// - `CacheError::Io` (`NotFound`) if the file is gone
    /// - `CacheError::Io` (`UnexpectedEof`) if the file is shorter than dumped
    /// - `CacheError::Io` (`InvalidData`) on size or checksum mismatch
    /// - `CacheError::Allocation` if the buffer cannot be allocated
    pub fn read_back(&self) -> Result<AlignedBytes> {
        let mut file = File::open(self.file.path())?;

        let on_disk = file.metadata()?.len();
        if on_disk < self.len as u64 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("dump truncated: {} of {} bytes", on_disk, self.len),
            )
            .into());
        }
        if on_disk > self.len as u64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("dump grew: {} bytes, expected {}", on_disk, self.len),
            )
            .into());
        }

        let mut bytes = AlignedBytes::zeroed(self.len)?;
        file.read_exact(bytes.as_mut_slice())?;

        if crc32fast::hash(bytes.as_slice()) != self.checksum {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "dump checksum mismatch").into());
        }

        Ok(bytes)
    }

    #[inline]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Number of bytes in the dump.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn checksum(&self) -> u32 {
        self.checksum
    }
}
