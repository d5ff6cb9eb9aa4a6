//! Workspace - central configuration hub.
//!
//! A Workspace represents the package being built: its root, manifest and
//! the directories every lifecycle command writes to.

use std::path::{Path, PathBuf};

use anyhow::Result;
use thiserror::Error;

use crate::core::model::ModelSource;
use crate::core::package::PackageIdentity;
use crate::core::platform::Platform;
use crate::core::Manifest;

/// Canonical manifest file name.
pub const MANIFEST_NAME: &str = "Stanbuild.toml";

/// Manifest lookup failure.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("could not find `{}` in `{}` or any parent directory", MANIFEST_NAME, .dir.display())]
    NotFound { dir: PathBuf },
}

/// Find the manifest in `dir` (no upward search).
pub fn find_manifest(dir: &Path) -> Result<PathBuf, ManifestError> {
    let path = dir.join(MANIFEST_NAME);
    if path.is_file() {
        Ok(path)
    } else {
        Err(ManifestError::NotFound {
            dir: dir.to_path_buf(),
        })
    }
}

/// The package being built and its build directories.
#[derive(Debug)]
pub struct Workspace {
    /// Package root (directory containing Stanbuild.toml)
    root: PathBuf,

    /// Parsed manifest
    manifest: Manifest,

    /// Distribution name and version
    identity: PackageIdentity,

    /// Staging directory the build command packages into
    build_lib: PathBuf,

    /// Platform family selecting the model source variant
    platform: Platform,
}

impl Workspace {
    /// Create a new workspace from a manifest path.
    pub fn new(manifest_path: &Path) -> Result<Self> {
        let manifest = Manifest::load(manifest_path)?;
        let root = manifest_path
            .parent()
            .unwrap_or(Path::new("."))
            .to_path_buf();

        Self::from_manifest(manifest, root)
    }

    /// Create a workspace from an already parsed manifest.
    pub fn from_manifest(manifest: Manifest, root: PathBuf) -> Result<Self> {
        let identity = manifest.identity()?;
        let build_lib = root.join("build").join("lib");

        Ok(Workspace {
            root,
            manifest,
            identity,
            build_lib,
            platform: Platform::host(),
        })
    }

    /// Use a custom staging directory.
    pub fn with_build_lib(mut self, build_lib: PathBuf) -> Self {
        self.build_lib = build_lib;
        self
    }

    /// Override the platform family.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Get the package root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the manifest.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Get the distribution identity.
    pub fn identity(&self) -> &PackageIdentity {
        &self.identity
    }

    /// Get the staging directory.
    pub fn build_lib(&self) -> &Path {
        &self.build_lib
    }

    /// Get the platform family.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Package sources copied by the packaging step.
    pub fn package_source_dir(&self) -> PathBuf {
        self.root.join(self.manifest.package_source())
    }

    /// Model source for the workspace platform.
    pub fn model_source(&self) -> ModelSource {
        ModelSource::locate(
            &self.manifest.models.name,
            &self.root.join(&self.manifest.models.source),
            self.platform,
        )
    }

    /// Artifact directory inside the staging area.
    pub fn staging_model_target(&self) -> PathBuf {
        self.build_lib.join(self.manifest.model_target())
    }

    /// Artifact directory inside the source tree, for in-place development.
    pub fn inplace_model_target(&self) -> PathBuf {
        self.root.join(self.manifest.model_target())
    }

    /// Project-local `.stanbuild` directory.
    pub fn stanbuild_dir(&self) -> PathBuf {
        self.root.join(".stanbuild")
    }

    /// Default install directory for development links.
    pub fn develop_dir(&self) -> PathBuf {
        self.stanbuild_dir().join("develop")
    }

    /// Project configuration file.
    pub fn config_path(&self) -> PathBuf {
        self.stanbuild_dir().join("config.toml")
    }
}
