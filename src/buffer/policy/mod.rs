//! Eviction policies.
//!
//! A policy looks at every registered buffer and the aggregate statistics and
//! returns the buffers it wants dumped. It never touches the buffers itself,
//! so [`EvictionPolicy::decide`] is a pure function of its inputs and a
//! policy can be swapped between two decisions.
//!
//! Built-in policies:
//! - [`NeverDump`] (`"never"`) - keeps everything in memory
//! - [`AlwaysDump`] (`"always"`) - dumps every unlocked buffer
//! - [`ThresholdDump`] (`"threshold"`) - keeps resident bytes under a ceiling
//! - [`BarrierDump`] (`"barrier"`) - dumps every buffer above a size barrier
//!
//! Parameters are plain strings so editors can list and change them without
//! knowing the concrete policy type.

mod always;
mod barrier;
mod never;
mod registry;
mod threshold;

pub use always::AlwaysDump;
pub use barrier::BarrierDump;
pub use never::NeverDump;
pub use registry::{PolicyFactory, PolicyRegistry};
pub use threshold::ThresholdDump;

use crate::buffer::{BufferInfo, CacheStatistics};
use crate::common::{BufferId, ByteSize, CacheError, Result};

/// Strategy deciding which buffers leave memory.
pub trait EvictionPolicy: Send + Sync {
    /// Registry name of this policy.
    fn name(&self) -> &str;

    /// Names accepted by [`get_param`](Self::get_param) and
    /// [`set_param`](Self::set_param).
    fn param_names(&self) -> &[&'static str] {
        &[]
    }

    /// Current value of a parameter, formatted for display and re-parsing.
    fn get_param(&self, name: &str) -> Result<String> {
        Err(unknown_param(self.name(), name))
    }

    /// Parse and apply a parameter value.
    fn set_param(&mut self, name: &str, _value: &str) -> Result<()> {
        Err(unknown_param(self.name(), name))
    }

    /// Buffers to dump, in the order they should be dumped.
    ///
    /// `records` holds every registered buffer; `stats` is their aggregate.
    fn decide(&self, records: &[BufferInfo], stats: &CacheStatistics) -> Vec<BufferId>;
}

impl std::fmt::Debug for dyn EvictionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvictionPolicy")
            .field("name", &self.name())
            .finish()
    }
}

pub(crate) fn unknown_param(policy: &str, name: &str) -> CacheError {
    CacheError::UnknownParameter {
        policy: policy.to_string(),
        name: name.to_string(),
    }
}

pub(crate) fn parse_size_param(name: &str, value: &str) -> Result<ByteSize> {
    ByteSize::parse(value).map_err(|_| CacheError::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
    })
}

/// Resident, unlocked buffers ordered from least to most recently accessed.
pub(crate) fn dump_candidates(records: &[BufferInfo]) -> Vec<&BufferInfo> {
    let mut candidates: Vec<&BufferInfo> = records
        .iter()
        .filter(|info| info.is_resident() && !info.is_locked())
        .collect();
    candidates.sort_by_key(|info| (info.last_access, info.id));
    candidates
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_candidates_skip_locked_and_dumped() {
        let records = [
            info(1, 10, 5),
            locked(info(2, 10, 1)),
            dumped(info(3, 10, 2)),
            info(4, 10, 3),
        ];

        let ids: Vec<BufferId> = dump_candidates(&records).iter().map(|i| i.id).collect();
        assert_eq!(ids, super::test_support::ids(&[4, 1]));
    }

    #[test]
    fn test_parse_size_param_maps_error() {
        assert_eq!(parse_size_param("ceiling", "1K").unwrap().as_bytes(), 1024);
        match parse_size_param("ceiling", "lots") {
            Err(CacheError::InvalidParameter { name, value }) => {
                assert_eq!(name, "ceiling");
                assert_eq!(value, "lots");
            }
            other => panic!("expected InvalidParameter, got {:?}", other),
        }
    }
}
