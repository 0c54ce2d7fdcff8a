//! Backend selection by name.
//!
//! A [`DatabaseAdapterFactory`] hands out [`AdapterBuilder`]s preloaded with
//! the default [`AdapterConfig`]. The [`AdapterRegistry`] maps backend names
//! to factories so callers can choose a backend at runtime.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::AdapterConfig;
use crate::error::{AdapterError, AdapterResult};
use crate::memory::InMemoryDatabaseAdapter;
use crate::traits::DatabaseAdapter;

/// Constructs a bare adapter from a validated config.
pub type AdapterConstructor = fn(AdapterConfig) -> AdapterResult<Arc<dyn DatabaseAdapter>>;

/// Named constructor of one kind of [`DatabaseAdapter`].
pub trait DatabaseAdapterFactory: Send + Sync {
    /// Stable identifier used to select this backend.
    fn name(&self) -> &'static str;

    /// A builder holding the default configuration.
    fn new_builder(&self) -> AdapterBuilder;
}

/// Configures and builds adapters. `build` may be called any number of
/// times; each call returns an independent, initialized adapter.
#[derive(Clone, Debug)]
pub struct AdapterBuilder {
    backend: &'static str,
    config: AdapterConfig,
    constructor: AdapterConstructor,
}

impl AdapterBuilder {
    pub fn new(backend: &'static str, constructor: AdapterConstructor) -> Self {
        Self {
            backend,
            config: AdapterConfig::default(),
            constructor,
        }
    }

    pub fn with_config(mut self, config: AdapterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn build(&self) -> AdapterResult<Arc<dyn DatabaseAdapter>> {
        self.config.validate()?;
        let adapter = (self.constructor)(self.config.clone())?;
        adapter.initialize_repo(&self.config.default_branch)?;
        debug!(
            backend = self.backend,
            repository = %self.config.repository_id,
            "adapter built"
        );
        Ok(adapter)
    }
}

/// Factory for [`InMemoryDatabaseAdapter`].
#[derive(Clone, Copy, Debug, Default)]
pub struct InMemoryAdapterFactory;

impl InMemoryAdapterFactory {
    pub const NAME: &'static str = "In-Memory";
}

impl DatabaseAdapterFactory for InMemoryAdapterFactory {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn new_builder(&self) -> AdapterBuilder {
        AdapterBuilder::new(Self::NAME, build_in_memory)
    }
}

fn build_in_memory(config: AdapterConfig) -> AdapterResult<Arc<dyn DatabaseAdapter>> {
    Ok(Arc::new(InMemoryDatabaseAdapter::new(config)?))
}

/// Backend name to factory map.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    factories: BTreeMap<&'static str, Arc<dyn DatabaseAdapterFactory>>,
}

impl AdapterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in backend.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(InMemoryAdapterFactory));
        registry
    }

    /// Add a factory, replacing any registered under the same name.
    pub fn register(&mut self, factory: Arc<dyn DatabaseAdapterFactory>) {
        self.factories.insert(factory.name(), factory);
    }

    /// Registered backend names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    pub fn factory(&self, name: &str) -> AdapterResult<&Arc<dyn DatabaseAdapterFactory>> {
        self.factories
            .get(name)
            .ok_or_else(|| AdapterError::UnknownBackend(name.to_string()))
    }

    /// A builder for the backend registered as `name`.
    pub fn builder(&self, name: &str) -> AdapterResult<AdapterBuilder> {
        Ok(self.factory(name)?.new_builder())
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("backends", &self.names())
            .finish()
    }
}
