//! Model source location.
//!
//! The model definition is backend-agnostic Stan code living under
//! `<package root>/<models.source>/<platform>/<models.name>.stan`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

use crate::core::platform::Platform;

/// Where a model's Stan source lives and what it is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSource {
    /// Model name, also the stem of artifact file names
    name: String,

    /// Platform-specific directory holding `<name>.stan`
    dir: PathBuf,
}

impl ModelSource {
    /// Create a model source from an explicit directory.
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        ModelSource {
            name: name.into(),
            dir: dir.into(),
        }
    }

    /// Locate the model source for a platform under a source root.
    pub fn locate(name: impl Into<String>, source_root: &Path, platform: Platform) -> Self {
        Self::new(name, source_root.join(platform.source_dir_name()))
    }

    /// Get the model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the platform-specific source directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path to the `.stan` file.
    pub fn stan_file(&self) -> PathBuf {
        self.dir.join(format!("{}.stan", self.name))
    }

    /// SHA-256 of the `.stan` file contents, hex encoded.
    pub fn digest(&self) -> Result<String> {
        let path = self.stan_file();
        let contents = std::fs::read(&path)
            .with_context(|| format!("failed to read model source: {}", path.display()))?;
        Ok(hex::encode(Sha256::digest(&contents)))
    }
}
