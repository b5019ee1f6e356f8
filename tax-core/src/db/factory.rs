use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::debug;

use super::repository::{RepositoryError, TaxRepository};

/// Where tax-year configuration is read from.
///
/// `backend` must match the [`RepositoryFactory::backend_name`] of a
/// registered factory. `location` is handed to that factory unchanged.
///
/// | backend | location examples          |
/// |---------|----------------------------|
/// | `csv`   | `tax-config`, `/etc/taxes` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub backend: String,
    pub location: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            backend: "csv".to_string(),
            location: "tax-config".to_string(),
        }
    }
}

/// Opens one kind of configuration source. Registered with a
/// [`RepositoryRegistry`] at startup.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Unique, lowercase identifier for this backend.
    fn backend_name(&self) -> &'static str;

    /// Opens the source and returns a ready-to-use repository. Sources are
    /// loaded and validated here, so a bad configuration fails early.
    async fn create(
        &self,
        config: &SourceConfig,
    ) -> Result<Box<dyn TaxRepository>, RepositoryError>;
}

/// Backends known to the process, keyed by name.
pub struct RepositoryRegistry {
    factories: BTreeMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registers a backend, replacing any factory with the same name.
    pub fn register(
        &mut self,
        factory: Box<dyn RepositoryFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Registered backend names in alphabetical order.
    pub fn available_backends(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    /// Dispatches to the factory matching `config.backend`.
    ///
    /// # Errors
    /// * [`RepositoryError::Configuration`] when no factory is registered
    ///   under the requested name.
    /// * Any error the chosen factory returns.
    pub async fn create(
        &self,
        config: &SourceConfig,
    ) -> Result<Box<dyn TaxRepository>, RepositoryError> {
        let Some(factory) = self.factories.get(config.backend.as_str()) else {
            return Err(RepositoryError::Configuration(format!(
                "no '{}' backend registered (have: {})",
                config.backend,
                self.available_backends().join(", ")
            )));
        };
        debug!(backend = %config.backend, location = %config.location, "opening repository");
        factory.create(config).await
    }
}

impl Default for RepositoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}
