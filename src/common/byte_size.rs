//! Human-readable byte sizes for policy parameters.

use std::fmt;
use std::str::FromStr;

use super::{CacheError, Result};

const KIB: usize = 1024;
const MIB: usize = 1024 * KIB;
const GIB: usize = 1024 * MIB;

/// A byte count that parses from and prints to human-readable strings.
///
/// # Parsing
/// Case-insensitive, binary multiples:
/// - `"4000"` → 4000 bytes
/// - `"4K"`, `"4KB"`, `"4KiB"` → 4 × 1024 bytes
/// - `"512M"`, `"512MB"`, `"512MiB"` → 512 × 1024² bytes
/// - `"1G"`, `"1GB"`, `"1GiB"` → 1024³ bytes
///
/// Zero is a legal size (a ceiling of zero dumps everything it can).
///
/// # Example
/// ```
/// use residency::ByteSize;
///
/// let size = ByteSize::parse("64 MiB").unwrap();
/// assert_eq!(size.as_bytes(), 64 * 1024 * 1024);
/// assert_eq!(size.to_string(), "64 MiB");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ByteSize(usize);

impl ByteSize {
    pub const fn from_bytes(bytes: usize) -> Self {
        Self(bytes)
    }

    pub const fn from_kib(kib: usize) -> Self {
        Self(kib * KIB)
    }

    pub const fn from_mib(mib: usize) -> Self {
        Self(mib * MIB)
    }

    pub const fn from_gib(gib: usize) -> Self {
        Self(gib * GIB)
    }

    #[inline]
    pub const fn as_bytes(&self) -> usize {
        self.0
    }

    /// Parse a human-readable size string.
    ///
    /// # Errors
    /// `CacheError::InvalidByteSize` for an empty string, an unknown suffix,
    /// a non-numeric value or an overflowing product.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let upper = trimmed.to_ascii_uppercase();

        let (num_str, multiplier) = [
            ("GIB", GIB),
            ("GB", GIB),
            ("G", GIB),
            ("MIB", MIB),
            ("MB", MIB),
            ("M", MIB),
            ("KIB", KIB),
            ("KB", KIB),
            ("K", KIB),
            ("B", 1),
        ]
        .iter()
        .find(|(suffix, _)| upper.ends_with(suffix))
        .map(|(suffix, mult)| (&trimmed[..trimmed.len() - suffix.len()], *mult))
        .unwrap_or((trimmed, 1));

        let value: usize = num_str
            .trim()
            .parse()
            .map_err(|_| CacheError::InvalidByteSize(s.to_string()))?;

        value
            .checked_mul(multiplier)
            .map(Self)
            .ok_or_else(|| CacheError::InvalidByteSize(s.to_string()))
    }
}

impl FromStr for ByteSize {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<usize> for ByteSize {
    fn from(bytes: usize) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for ByteSize {
    /// Largest exact binary unit, or the raw byte count.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0;
        if bytes == 0 {
            return write!(f, "0");
        }
        for (unit, size) in [("GiB", GIB), ("MiB", MIB), ("KiB", KIB)] {
            if bytes % size == 0 {
                return write!(f, "{} {}", bytes / size, unit);
            }
        }
        write!(f, "{}", bytes)
    }
}
