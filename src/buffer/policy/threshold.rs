//! Policy that keeps resident memory under a ceiling.

use super::{dump_candidates, parse_size_param, unknown_param, EvictionPolicy};
use crate::buffer::{BufferInfo, CacheStatistics};
use crate::common::{BufferId, ByteSize, Result};

const CEILING: &str = "ceiling";
const MIN_BUFFER_SIZE: &str = "min_buffer_size";
const HYSTERESIS: &str = "hysteresis";

/// Dumps least-recently-accessed buffers while resident bytes exceed a ceiling.
///
/// # Parameters
/// - `ceiling` - resident bytes allowed before dumping starts (default 1 GiB)
/// - `min_buffer_size` - smaller buffers are never chosen (default 0)
/// - `hysteresis` - once over the ceiling, keep dumping until resident bytes
///   are at or below `ceiling - hysteresis` (default 0)
///
/// The hysteresis avoids dumping one buffer per registration when the cache
/// hovers right at the ceiling.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdDump {
    ceiling: ByteSize,
    min_buffer_size: ByteSize,
    hysteresis: ByteSize,
}

impl ThresholdDump {
    pub const NAME: &'static str = "threshold";

    pub fn new(ceiling: ByteSize) -> Self {
        Self {
            ceiling,
            min_buffer_size: ByteSize::from_bytes(0),
            hysteresis: ByteSize::from_bytes(0),
        }
    }

    pub fn with_min_buffer_size(mut self, size: ByteSize) -> Self {
        self.min_buffer_size = size;
        self
    }

    pub fn with_hysteresis(mut self, size: ByteSize) -> Self {
        self.hysteresis = size;
        self
    }

    pub fn ceiling(&self) -> ByteSize {
        self.ceiling
    }

    /// Resident size dumping stops at.
    fn target(&self) -> usize {
        self.ceiling
            .as_bytes()
            .saturating_sub(self.hysteresis.as_bytes())
    }
}

impl Default for ThresholdDump {
    fn default() -> Self {
        Self::new(ByteSize::from_gib(1))
    }
}

impl EvictionPolicy for ThresholdDump {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn param_names(&self) -> &[&'static str] {
        &[CEILING, MIN_BUFFER_SIZE, HYSTERESIS]
    }

    fn get_param(&self, name: &str) -> Result<String> {
        match name {
            CEILING => Ok(self.ceiling.to_string()),
            MIN_BUFFER_SIZE => Ok(self.min_buffer_size.to_string()),
            HYSTERESIS => Ok(self.hysteresis.to_string()),
            _ => Err(unknown_param(Self::NAME, name)),
        }
    }

    fn set_param(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            CEILING => self.ceiling = parse_size_param(name, value)?,
            MIN_BUFFER_SIZE => self.min_buffer_size = parse_size_param(name, value)?,
            HYSTERESIS => self.hysteresis = parse_size_param(name, value)?,
            _ => return Err(unknown_param(Self::NAME, name)),
        }
        Ok(())
    }

    fn decide(&self, records: &[BufferInfo], stats: &CacheStatistics) -> Vec<BufferId> {
        let mut resident = stats.total_resident();
        if resident <= self.ceiling.as_bytes() {
            return Vec::new();
        }

        let target = self.target();
        let mut victims = Vec::new();
        for info in dump_candidates(records) {
            if resident <= target {
                break;
            }
            if info.size < self.min_buffer_size.as_bytes() {
                continue;
            }
            victims.push(info.id);
            resident -= info.size;
        }
        victims
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::common::CacheError;

    fn decide(policy: &ThresholdDump, records: &[BufferInfo]) -> Vec<BufferId> {
        policy.decide(records, &CacheStatistics::from_infos(records))
    }

    #[test]
    fn test_under_ceiling_keeps_everything() {
        let policy = ThresholdDump::new(ByteSize::from_bytes(100));
        let records = [info(1, 50, 1), info(2, 50, 2)];
        assert!(decide(&policy, &records).is_empty());
    }

    #[test]
    fn test_dumps_lru_until_under_ceiling() {
        let policy = ThresholdDump::new(ByteSize::from_bytes(100));
        let records = [info(1, 60, 3), info(2, 60, 1), info(3, 60, 2)];
        // 180 resident: drop oldest (2), then next oldest (3) → 60.
        assert_eq!(decide(&policy, &records), ids(&[2, 3]));
    }

    #[test]
    fn test_zero_ceiling_dumps_all_candidates() {
        let policy = ThresholdDump::new(ByteSize::from_bytes(0));
        let records = [info(1, 4000, 1)];
        assert_eq!(decide(&policy, &records), ids(&[1]));
    }

    #[test]
    fn test_locked_and_dumped_buffers_are_skipped() {
        let policy = ThresholdDump::new(ByteSize::from_bytes(10));
        let records = [locked(info(1, 50, 1)), dumped(info(2, 50, 2)), info(3, 50, 3)];
        assert_eq!(decide(&policy, &records), ids(&[3]));
    }

    #[test]
    fn test_min_buffer_size_filters_small_buffers() {
        let policy =
            ThresholdDump::new(ByteSize::from_bytes(0)).with_min_buffer_size(ByteSize::from_bytes(100));
        let records = [info(1, 10, 1), info(2, 200, 2)];
        assert_eq!(decide(&policy, &records), ids(&[2]));
    }

    #[test]
    fn test_hysteresis_dumps_below_ceiling() {
        let policy =
            ThresholdDump::new(ByteSize::from_bytes(100)).with_hysteresis(ByteSize::from_bytes(50));
        let records = [info(1, 40, 1), info(2, 40, 2), info(3, 40, 3)];
        // 120 > 100: dump to ≤ 50 → two buffers.
        assert_eq!(decide(&policy, &records), ids(&[1, 2]));
    }

    #[test]
    fn test_params_round_trip() {
        let mut policy = ThresholdDump::default();
        assert_eq!(policy.param_names(), &[CEILING, MIN_BUFFER_SIZE, HYSTERESIS]);
        assert_eq!(policy.get_param(CEILING).unwrap(), "1 GiB");

        policy.set_param(CEILING, "512M").unwrap();
        policy.set_param(HYSTERESIS, "4000").unwrap();
        assert_eq!(policy.get_param(CEILING).unwrap(), "512 MiB");
        assert_eq!(policy.get_param(HYSTERESIS).unwrap(), "4000");
        assert_eq!(policy.ceiling(), ByteSize::from_mib(512));
    }

    #[test]
    fn test_bad_params() {
        let mut policy = ThresholdDump::default();
        assert!(matches!(
            policy.set_param(CEILING, "huge"),
            Err(CacheError::InvalidParameter { .. })
        ));
        assert!(matches!(
            policy.set_param("barrier", "1"),
            Err(CacheError::UnknownParameter { .. })
        ));
        assert_eq!(policy.ceiling(), ByteSize::from_gib(1));
    }
}
