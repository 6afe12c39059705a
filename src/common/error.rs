//! Error types for the residency cache.

use super::BufferId;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, CacheError>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, CacheError>;

/// All possible errors in the residency cache.
///
/// Programmer errors (`OutOfBounds`, `NotLocked`, ...) are reported the same
/// way as runtime failures so that no access path can fall back to undefined
/// behavior.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Memory for a buffer could not be obtained.
    ///
    /// The buffer is left in the state it had before the failed operation.
    #[error("Failed to allocate {requested} bytes")]
    Allocation { requested: usize },

    /// An index exceeds the extent of its dimension.
    #[error("Index {index} out of bounds for dimension {dimension} (extent {extent})")]
    OutOfBounds {
        dimension: usize,
        index: usize,
        extent: usize,
    },

    /// The number of indices does not match the number of dimensions.
    #[error("Expected {expected} indices, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Typed access with a type whose size differs from the element size.
    #[error("Element type mismatch: array holds {expected}, accessed as {actual}")]
    ElementMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// A borrowed buffer is not suitably aligned for the requested type.
    #[error("Buffer address is not aligned to {align} bytes")]
    Misaligned { align: usize },

    /// A caller-supplied buffer is smaller than the layout placed on it.
    #[error("Buffer of {actual} bytes cannot hold {required} bytes")]
    BufferTooSmall { required: usize, actual: usize },

    /// Direct access was attempted without holding a scoped lock.
    #[error("Buffer is not locked")]
    NotLocked,

    /// A dump was attempted while scoped locks are outstanding.
    ///
    /// This is the only recoverable kind: retry once the locks are released.
    #[error("{0} is locked")]
    BufferLocked(BufferId),

    /// The handle is not (or no longer) registered with the manager.
    #[error("{0} is not registered")]
    UnknownBuffer(BufferId),

    /// I/O error from temp storage (dump write, restore read, cleanup).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No free temporary name was found within the suffix length budget.
    #[error("No free temporary path for prefix '{prefix}'")]
    TempAllocation { prefix: String },

    /// No policy factory is registered under this name.
    #[error("Unknown eviction policy '{0}'")]
    UnknownPolicy(String),

    /// The active policy has no parameter with this name.
    #[error("Policy '{policy}' has no parameter '{name}'")]
    UnknownParameter { policy: String, name: String },

    /// The parameter exists but the value could not be applied.
    #[error("Invalid value '{value}' for parameter '{name}'")]
    InvalidParameter { name: String, value: String },

    /// A human-readable byte size could not be parsed.
    #[error("Invalid byte size '{0}'")]
    InvalidByteSize(String),
}

impl CacheError {
    /// Whether the caller may simply retry the operation later.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CacheError::BufferLocked(_))
    }
}
