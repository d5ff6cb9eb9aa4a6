//! Stanbuild.toml manifest parsing and schema.
//!
//! The manifest names the package, where its Stan model lives, where compiled
//! artifacts go, and how its test suite is run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::core::package::PackageIdentity;

/// The parsed Stanbuild.toml manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Package metadata
    pub package: PackageMetadata,

    /// Model compilation settings
    #[serde(default)]
    pub models: ModelsConfig,

    /// Test suite settings
    #[serde(default)]
    pub test: TestConfig,
}

/// `[package]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageMetadata {
    /// Distribution name
    pub name: String,

    /// Distribution version (semver)
    pub version: String,

    /// Directory holding the package sources, relative to the root.
    /// Defaults to the package name.
    #[serde(default)]
    pub source: Option<PathBuf>,
}

/// `[models]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ModelsConfig {
    /// Model name; the source file is `<name>.stan`
    #[serde(default = "default_model_name")]
    pub name: String,

    /// Directory holding one subdirectory per platform family
    #[serde(default = "default_model_source")]
    pub source: PathBuf,

    /// Artifact directory, relative to the staging dir or the package root
    #[serde(default)]
    pub target: Option<PathBuf>,
}

fn default_model_name() -> String {
    "prophet".to_string()
}

fn default_model_source() -> PathBuf {
    PathBuf::from("stan")
}

impl Default for ModelsConfig {
    fn default() -> Self {
        ModelsConfig {
            name: default_model_name(),
            source: default_model_source(),
            target: None,
        }
    }
}

/// `[test]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestConfig {
    /// Test runner command line; the selector is appended
    #[serde(default = "default_test_command")]
    pub command: Vec<String>,

    /// Default test selector
    #[serde(default)]
    pub suite: Option<String>,

    /// Environment variable carrying the module search path
    #[serde(default = "default_search_path_var")]
    pub search_path_var: String,
}

fn default_test_command() -> Vec<String> {
    vec!["python".into(), "-m".into(), "unittest".into()]
}

fn default_search_path_var() -> String {
    "PYTHONPATH".to_string()
}

impl Default for TestConfig {
    fn default() -> Self {
        TestConfig {
            command: default_test_command(),
            suite: None,
            search_path_var: default_search_path_var(),
        }
    }
}

impl Manifest {
    /// Load a manifest from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;

        Self::parse(&contents)
            .with_context(|| format!("failed to parse manifest: {}", path.display()))
    }

    /// Parse and validate manifest contents.
    pub fn parse(contents: &str) -> Result<Self> {
        let manifest: Manifest = toml::from_str(contents)?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<()> {
        if self.package.name.trim().is_empty() {
            anyhow::bail!("package name cannot be empty");
        }
        self.version()?;
        if self.models.name.trim().is_empty() {
            anyhow::bail!("model name cannot be empty");
        }
        if self.test.command.is_empty() {
            anyhow::bail!("test command cannot be empty");
        }
        Ok(())
    }

    /// Parse the package version.
    pub fn version(&self) -> Result<Version> {
        Version::parse(&self.package.version)
            .with_context(|| format!("invalid package version `{}`", self.package.version))
    }

    /// Name and version of the distribution this manifest describes.
    pub fn identity(&self) -> Result<PackageIdentity> {
        Ok(PackageIdentity::new(&self.package.name, self.version()?))
    }

    /// Package source directory, relative to the root.
    pub fn package_source(&self) -> PathBuf {
        self.package
            .source
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.package.name))
    }

    /// Model artifact directory, relative to the staging dir or the root.
    pub fn model_target(&self) -> PathBuf {
        self.models
            .target
            .clone()
            .unwrap_or_else(|| self.package_source().join("stan_model"))
    }
}
