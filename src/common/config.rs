//! Configuration constants and manager configuration.

use std::path::PathBuf;

/// Policy installed when a manager is created without naming one.
pub const DEFAULT_POLICY: &str = "never";

/// Prefix of the process-wide temp root created under the platform temp dir.
pub const ROOT_DIR_PREFIX: &str = "residency-";

/// Prefix of every dump file created under the temp root.
pub const DUMP_FILE_PREFIX: &str = "dump-";

/// Length of the random suffix on the first naming attempt.
pub const MIN_SUFFIX_LEN: usize = 4;

/// Growth of the random suffix after each collision.
pub const SUFFIX_LEN_STEP: usize = 2;

/// Longest random suffix tried before giving up.
pub const MAX_SUFFIX_LEN: usize = 64;

/// Configuration for a [`BufferManager`](crate::BufferManager).
///
/// # Example
/// ```
/// use residency::ManagerConfig;
///
/// let config = ManagerConfig::default()
///     .with_policy("threshold")
///     .with_param("ceiling", "512 MiB");
/// assert_eq!(config.policy, "threshold");
/// ```
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Registry name of the policy installed at construction.
    pub policy: String,

    /// Parameters applied to that policy, in order.
    pub params: Vec<(String, String)>,

    /// Directory under which the temp root is created.
    pub temp_parent: PathBuf,

    /// Run the policy after every registration and reallocation.
    pub auto_evict: bool,
}

impl ManagerConfig {
    pub fn with_policy(mut self, name: impl Into<String>) -> Self {
        self.policy = name.into();
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn with_temp_parent(mut self, parent: impl Into<PathBuf>) -> Self {
        self.temp_parent = parent.into();
        self
    }

    pub fn with_auto_evict(mut self, auto_evict: bool) -> Self {
        self.auto_evict = auto_evict;
        self
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            policy: DEFAULT_POLICY.to_string(),
            params: Vec::new(),
            temp_parent: std::env::temp_dir(),
            auto_evict: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_budget() {
        assert!(MIN_SUFFIX_LEN <= MAX_SUFFIX_LEN);
        assert_eq!((MAX_SUFFIX_LEN - MIN_SUFFIX_LEN) % SUFFIX_LEN_STEP, 0);
    }

    #[test]
    fn test_builder_keeps_param_order() {
        let config = ManagerConfig::default()
            .with_policy("threshold")
            .with_param("ceiling", "1G")
            .with_param("hysteresis", "64M")
            .with_auto_evict(false);

        assert_eq!(config.policy, "threshold");
        assert_eq!(config.params[0].0, "ceiling");
        assert_eq!(config.params[1].0, "hysteresis");
        assert!(!config.auto_evict);
    }

    #[test]
    fn test_default_uses_platform_temp_dir() {
        let config = ManagerConfig::default();
        assert_eq!(config.policy, DEFAULT_POLICY);
        assert_eq!(config.temp_parent, std::env::temp_dir());
        assert!(config.auto_evict);
    }
}
