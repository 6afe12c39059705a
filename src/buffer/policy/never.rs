//! Policy that keeps every buffer in memory.

use super::EvictionPolicy;
use crate::buffer::{BufferInfo, CacheStatistics};
use crate::common::BufferId;

/// Never dumps anything. Buffers only leave memory through explicit dumps.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverDump;

impl NeverDump {
    pub const NAME: &'static str = "never";

    pub fn new() -> Self {
        Self
    }
}

impl EvictionPolicy for NeverDump {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn decide(&self, _records: &[BufferInfo], _stats: &CacheStatistics) -> Vec<BufferId> {
        Vec::new()
    }
}
