//! Backend registry - resolves backend names to model builders.
//!
//! Key principle: Registry construction never fails and does no I/O.
//! Toolchain availability is checked lazily via `builder.availability()`
//! or surfaces as a `BuildError` when the backend actually builds.

use std::collections::BTreeMap;

use crate::builder::backend::BackendId;
use crate::builder::cmdstan::CmdStanBuilder;
use crate::builder::errors::ConfigurationError;
use crate::builder::model_builder::{BackendAvailability, ModelBuilder};
use crate::builder::pystan::PyStanBuilder;
use crate::util::config::ToolchainSettings;

/// Registry of model builders, one per [`BackendId`].
///
/// The set of names is closed: `register` can swap the builder behind an
/// existing id but there is no way to add a name `BackendId` does not know.
pub struct BackendRegistry {
    builders: BTreeMap<BackendId, Box<dyn ModelBuilder>>,
}

impl BackendRegistry {
    /// Create a registry with every built-in backend, toolchains from PATH
    /// and the environment.
    pub fn new() -> Self {
        Self::from_toolchain(&ToolchainSettings::default())
    }

    /// Create a registry with every built-in backend, using configured
    /// toolchain locations where given.
    pub fn from_toolchain(settings: &ToolchainSettings) -> Self {
        let mut registry = BackendRegistry {
            builders: BTreeMap::new(),
        };

        registry.register(Box::new(
            PyStanBuilder::new().with_python(settings.python.clone()),
        ));
        registry.register(Box::new(
            CmdStanBuilder::new()
                .with_home(settings.cmdstan.clone())
                .with_make(settings.make.clone()),
        ));

        registry
    }

    /// Register a builder, replacing any builder for the same backend.
    pub fn register(&mut self, builder: Box<dyn ModelBuilder>) {
        self.builders.insert(builder.backend(), builder);
    }

    /// Get a builder by ID.
    pub fn get(&self, id: BackendId) -> Option<&dyn ModelBuilder> {
        self.builders.get(&id).map(|b| b.as_ref())
    }

    /// Resolve a backend name from the selection list.
    ///
    /// Fails with [`ConfigurationError::UnknownBackend`] for any name outside
    /// the supported set, including the empty string. Never falls back to a
    /// default.
    pub fn resolve(&self, name: &str) -> Result<&dyn ModelBuilder, ConfigurationError> {
        let id: BackendId = name
            .parse()
            .map_err(|_| ConfigurationError::unknown_backend(name))?;
        self.get(id)
            .ok_or_else(|| ConfigurationError::unknown_backend(name))
    }

    /// Get all registered backend IDs, in registry order.
    pub fn ids(&self) -> impl Iterator<Item = BackendId> + '_ {
        self.builders.keys().copied()
    }

    /// Get all registered builders, in registry order.
    pub fn all(&self) -> impl Iterator<Item = &dyn ModelBuilder> + '_ {
        self.builders.values().map(|b| b.as_ref())
    }

    /// Get the number of registered backends.
    pub fn len(&self) -> usize {
        self.builders.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    /// Check if a backend is registered.
    pub fn contains(&self, id: BackendId) -> bool {
        self.builders.contains_key(&id)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary of a backend for display purposes.
#[derive(Debug, Clone)]
pub struct BackendSummary {
    pub id: BackendId,
    pub availability: BackendAvailability,
    pub description: &'static str,
    /// Whether this is the backend built when nothing is selected
    pub is_default: bool,
}

/// Summaries of every registered backend.
///
/// Probes every toolchain, so it may be slow.
pub fn get_backend_summaries(registry: &BackendRegistry) -> Vec<BackendSummary> {
    registry
        .all()
        .map(|builder| {
            let id = builder.backend();
            BackendSummary {
                id,
                availability: builder.availability(),
                description: id.description(),
                is_default: id == BackendId::DEFAULT,
            }
        })
        .collect()
}
