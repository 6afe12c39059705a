//! Name-keyed policy factories.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{AlwaysDump, BarrierDump, EvictionPolicy, NeverDump, ThresholdDump};
use crate::common::{CacheError, Result};

/// Builds a default-configured policy.
pub type PolicyFactory = Arc<dyn Fn() -> Box<dyn EvictionPolicy> + Send + Sync>;

/// Maps policy names to factories.
///
/// # Example
/// ```
/// use residency::PolicyRegistry;
///
/// let registry = PolicyRegistry::with_builtins();
/// assert_eq!(registry.names(), vec!["always", "barrier", "never", "threshold"]);
///
/// let policy = registry.create("threshold").unwrap();
/// assert_eq!(policy.name(), "threshold");
/// ```
#[derive(Clone, Default)]
pub struct PolicyRegistry {
    factories: BTreeMap<String, PolicyFactory>,
}

impl PolicyRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in policies.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(NeverDump::NAME, || Box::new(NeverDump::new()));
        registry.register(AlwaysDump::NAME, || Box::new(AlwaysDump::new()));
        registry.register(ThresholdDump::NAME, || Box::new(ThresholdDump::default()));
        registry.register(BarrierDump::NAME, || Box::new(BarrierDump::default()));
        registry
    }

    /// Add or replace a factory.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn EvictionPolicy> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Build a fresh policy.
    ///
    /// # Errors
    /// `CacheError::UnknownPolicy` if nothing is registered under `name`.
    pub fn create(&self, name: &str) -> Result<Box<dyn EvictionPolicy>> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| CacheError::UnknownPolicy(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }
}

impl std::fmt::Debug for PolicyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyRegistry")
            .field("names", &self.names())
            .finish()
    }
}
