//! Backend registry: resolves access-mode strings to backends.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::backend::{BackendConfig, BackendFactory, HadamardBackend};
use crate::error::{HalError, HalResult};

/// Factory function type for registered backends.
type Factory = Box<dyn Fn(BackendConfig) -> HalResult<Arc<dyn HadamardBackend>> + Send + Sync>;

/// Central registry for Hadamard-test backends.
///
/// Names are matched case-insensitively. Aliases point at the same factory.
pub struct BackendRegistry {
    factories: FxHashMap<String, Factory>,
    aliases: FxHashMap<String, String>,
    configs: FxHashMap<String, BackendConfig>,
}

impl BackendRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: FxHashMap::default(),
            aliases: FxHashMap::default(),
            configs: FxHashMap::default(),
        }
    }

    /// Register a backend type under `name`.
    pub fn register<B>(&mut self, name: impl Into<String>)
    where
        B: BackendFactory + 'static,
    {
        let name = name.into().to_lowercase();
        debug!("Registering backend: {}", name);
        self.factories.insert(
            name,
            Box::new(|config| {
                let backend = B::from_config(config)?;
                Ok(Arc::new(backend) as Arc<dyn HadamardBackend>)
            }),
        );
    }

    /// Register a backend with a custom constructor.
    pub fn register_factory(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn(BackendConfig) -> HalResult<Arc<dyn HadamardBackend>> + Send + Sync + 'static,
    ) {
        let name = name.into().to_lowercase();
        debug!("Registering factory backend: {}", name);
        self.factories.insert(name, Box::new(factory));
    }

    /// Make `alias` resolve to the backend registered as `target`.
    pub fn alias(&mut self, alias: impl Into<String>, target: impl Into<String>) {
        self.aliases
            .insert(alias.into().to_lowercase(), target.into().to_lowercase());
    }

    /// Store the configuration used when `name` is resolved. Aliases are
    /// followed, so configuring an alias configures its target.
    pub fn configure(&mut self, config: BackendConfig) {
        let key = config.name.to_lowercase();
        let key = self.aliases.get(&key).cloned().unwrap_or(key);
        self.configs.insert(key, config);
    }

    /// Whether `access` names a registered backend or alias.
    pub fn contains(&self, access: &str) -> bool {
        self.canonical(access).is_some()
    }

    /// Registered backend names, sorted.
    pub fn available(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Instantiate the backend for an access string.
    ///
    /// Unknown strings fail with [`HalError::UnsupportedAccess`].
    pub fn resolve(&self, access: &str) -> HalResult<Arc<dyn HadamardBackend>> {
        let name = self
            .canonical(access)
            .ok_or_else(|| HalError::UnsupportedAccess(access.to_string()))?;
        let config = self
            .configs
            .get(&name)
            .cloned()
            .unwrap_or_else(|| BackendConfig::new(name.clone()));
        let factory = self
            .factories
            .get(&name)
            .ok_or_else(|| HalError::UnsupportedAccess(access.to_string()))?;
        debug!("Resolved access '{}' to backend '{}'", access, name);
        factory(config)
    }

    fn canonical(&self, access: &str) -> Option<String> {
        let key = access.to_lowercase();
        let name = self.aliases.get(&key).cloned().unwrap_or(key);
        self.factories.contains_key(&name).then_some(name)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}
