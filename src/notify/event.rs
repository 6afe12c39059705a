//! Events published by the buffer manager.

use std::fmt;

use crate::buffer::Residency;
use crate::common::BufferId;

/// A buffer entered or left the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryChange {
    Registered,
    Unregistered,
}

/// Something observers of the cache may care about.
///
/// Events for one buffer arrive in the order its transitions happened.
/// Events for different buffers carry no relative ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEvent {
    /// A buffer was registered or unregistered.
    Registry {
        id: BufferId,
        change: RegistryChange,
        size: usize,
    },

    /// A buffer was dumped or restored; `size` bytes moved.
    Residency {
        id: BufferId,
        residency: Residency,
        size: usize,
    },
}

impl CacheEvent {
    pub fn id(&self) -> BufferId {
        match self {
            CacheEvent::Registry { id, .. } | CacheEvent::Residency { id, .. } => *id,
        }
    }

    pub fn size(&self) -> usize {
        match self {
            CacheEvent::Registry { size, .. } | CacheEvent::Residency { size, .. } => *size,
        }
    }
}

impl fmt::Display for CacheEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheEvent::Registry { id, change, size } => {
                write!(f, "{} {:?} ({} bytes)", id, change, size)
            }
            CacheEvent::Residency {
                id,
                residency,
                size,
            } => write!(f, "{} now {} ({} bytes)", id, residency, size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_accessors() {
        let event = CacheEvent::Residency {
            id: BufferId::new(7),
            residency: Residency::Dumped,
            size: 4000,
        };
        assert_eq!(event.id(), BufferId::new(7));
        assert_eq!(event.size(), 4000);
        assert_eq!(event.to_string(), "Buffer(7) now dumped (4000 bytes)");

        let event = CacheEvent::Registry {
            id: BufferId::new(1),
            change: RegistryChange::Registered,
            size: 8,
        };
        assert_eq!(event.to_string(), "Buffer(1) Registered (8 bytes)");
    }
}
