//! Policy that dumps everything it can.

use super::{dump_candidates, EvictionPolicy};
use crate::buffer::{BufferInfo, CacheStatistics};
use crate::common::BufferId;

/// Dumps every resident, unlocked buffer on each decision.
///
/// Keeps the memory footprint at the locked working set; every unlock-then-
/// lock cycle costs a restore.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysDump;

impl AlwaysDump {
    pub const NAME: &'static str = "always";

    pub fn new() -> Self {
        Self
    }
}

impl EvictionPolicy for AlwaysDump {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn decide(&self, records: &[BufferInfo], _stats: &CacheStatistics) -> Vec<BufferId> {
        dump_candidates(records).iter().map(|info| info.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn test_always_dumps_unlocked_resident_oldest_first() {
        let records = [
            info(1, 10, 3),
            info(2, 10, 1),
            locked(info(3, 10, 0)),
            dumped(info(4, 10, 0)),
        ];
        let stats = CacheStatistics::from_infos(&records);

        assert_eq!(AlwaysDump::new().decide(&records, &stats), ids(&[2, 1]));
    }
}
