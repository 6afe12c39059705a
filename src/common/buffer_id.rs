//! Buffer identifier type.

use std::fmt;

/// Identifies a buffer registered with a [`BufferManager`](crate::BufferManager).
///
/// The id is handed out by the manager and never reused within it. Unlike the
/// buffer's address, it stays valid while the bytes live only on disk.
///
/// # Example
/// ```
/// use residency::BufferId;
///
/// let id = BufferId::new(7);
/// assert_eq!(id.0, 7);
/// assert_eq!(id.to_string(), "Buffer(7)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u64);

impl BufferId {
    /// Create a new BufferId.
    #[inline]
    pub fn new(id: u64) -> Self {
        BufferId(id)
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Buffer({})", self.0)
    }
}
