//! Policy that dumps large buffers as soon as they appear.

use super::{dump_candidates, parse_size_param, unknown_param, EvictionPolicy};
use crate::buffer::{BufferInfo, CacheStatistics};
use crate::common::{BufferId, ByteSize, Result};

const BARRIER: &str = "barrier";

/// Dumps every resident, unlocked buffer at least `barrier` bytes large.
///
/// Aggregate memory is ignored: a single large volume leaves memory as soon
/// as nobody holds it, small buffers never do.
#[derive(Debug, Clone, Copy)]
pub struct BarrierDump {
    barrier: ByteSize,
}

impl BarrierDump {
    pub const NAME: &'static str = "barrier";

    pub fn new(barrier: ByteSize) -> Self {
        Self { barrier }
    }

    pub fn barrier(&self) -> ByteSize {
        self.barrier
    }
}

impl Default for BarrierDump {
    fn default() -> Self {
        Self::new(ByteSize::from_mib(64))
    }
}

impl EvictionPolicy for BarrierDump {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn param_names(&self) -> &[&'static str] {
        &[BARRIER]
    }

    fn get_param(&self, name: &str) -> Result<String> {
        match name {
            BARRIER => Ok(self.barrier.to_string()),
            _ => Err(unknown_param(Self::NAME, name)),
        }
    }

    fn set_param(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            BARRIER => {
                self.barrier = parse_size_param(name, value)?;
                Ok(())
            }
            _ => Err(unknown_param(Self::NAME, name)),
        }
    }

    fn decide(&self, records: &[BufferInfo], _stats: &CacheStatistics) -> Vec<BufferId> {
        dump_candidates(records)
            .iter()
            .filter(|info| info.size >= self.barrier.as_bytes())
            .map(|info| info.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn test_dumps_only_buffers_at_or_above_barrier() {
        let policy = BarrierDump::new(ByteSize::from_bytes(100));
        let records = [
            info(1, 99, 1),
            info(2, 100, 2),
            info(3, 500, 3),
            locked(info(4, 500, 0)),
        ];
        let stats = CacheStatistics::from_infos(&records);
        assert_eq!(policy.decide(&records, &stats), ids(&[2, 3]));
    }

    #[test]
    fn test_barrier_param() {
        let mut policy = BarrierDump::default();
        assert_eq!(policy.get_param("barrier").unwrap(), "64 MiB");
        policy.set_param("barrier", "1 KiB").unwrap();
        assert_eq!(policy.barrier(), ByteSize::from_kib(1));
        assert!(policy.get_param("ceiling").is_err());
    }
}
