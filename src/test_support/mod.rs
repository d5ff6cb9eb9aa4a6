//! Test utilities and fakes for stanbuild unit tests.
//!
//! Real backends need a Python interpreter with PyStan or a CmdStan
//! checkout. Tests swap them out through [`BackendRegistry::register`] with
//! a [`FakeBuilder`] that writes a placeholder artifact following the same
//! naming contract, or fails on demand.
//!
//! # Example
//!
//! ```rust,ignore
//! use stanbuild::test_support::{registry_with, FakeBuilder, PackageFixture};
//!
//! #[test]
//! fn test_example() {
//!     let pystan = FakeBuilder::ok(BackendId::PyStan);
//!     let registry = registry_with(vec![pystan.clone()]);
//!     let fixture = PackageFixture::new("fbprophet").write(tmp.path());
//!
//!     // Run hooks against `registry`...
//!     assert_eq!(pystan.calls(), 1);
//! }
//! ```

pub mod fixtures;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;

use crate::builder::artifacts::artifact_path;
use crate::builder::{BackendAvailability, BackendId, BackendRegistry, BuildError, ModelBuilder};
use crate::core::ModelSource;

pub use fixtures::*;

/// A model builder that records calls and writes placeholder artifacts.
///
/// Clones share their call log, so a test can keep one handle and hand the
/// other to a registry.
#[derive(Debug, Clone)]
pub struct FakeBuilder {
    backend: BackendId,
    failure: Option<String>,
    calls: Arc<Mutex<Vec<PathBuf>>>,
}

impl FakeBuilder {
    /// A builder that succeeds.
    pub fn ok(backend: BackendId) -> Self {
        FakeBuilder {
            backend,
            failure: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A builder that fails with `message` after being called.
    pub fn failing(backend: BackendId, message: impl Into<String>) -> Self {
        FakeBuilder {
            failure: Some(message.into()),
            ..Self::ok(backend)
        }
    }

    /// Number of build calls so far.
    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Target directories passed to `build`, in call order.
    pub fn targets(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }
}

impl ModelBuilder for FakeBuilder {
    fn backend(&self) -> BackendId {
        self.backend
    }

    fn availability(&self) -> BackendAvailability {
        BackendAvailability::Available {
            location: PathBuf::from("fake"),
        }
    }

    fn build(&self, target_dir: &Path, model: &ModelSource) -> Result<Vec<PathBuf>, BuildError> {
        self.calls.lock().unwrap().push(target_dir.to_path_buf());

        if let Some(message) = &self.failure {
            return Err(BuildError::new(self.backend, anyhow!("{}", message)));
        }
        if !model.stan_file().is_file() {
            return Err(BuildError::new(
                self.backend,
                anyhow!("model source not found: {}", model.stan_file().display()),
            ));
        }

        let artifact = artifact_path(target_dir, self.backend, model.name());
        std::fs::write(&artifact, format!("{} {}", self.backend, model.name()))
            .map_err(|e| BuildError::new(self.backend, e))?;
        Ok(vec![artifact])
    }
}

/// A registry whose backends are replaced by the given fakes.
pub fn registry_with(builders: Vec<FakeBuilder>) -> BackendRegistry {
    let mut registry = BackendRegistry::new();
    for builder in builders {
        registry.register(Box::new(builder));
    }
    registry
}

/// Write `<dir>/model/prophet.stan` and return its model source.
pub fn write_model(dir: &Path) -> ModelSource {
    let model = ModelSource::new("prophet", dir.join("model"));
    std::fs::create_dir_all(model.dir()).unwrap();
    std::fs::write(model.stan_file(), STAN_PROGRAM).unwrap();
    model
}
