//! Artifact naming contract and build reports.
//!
//! Every backend writes `<model>_model.<ext>` into the target directory,
//! with an extension unique to the backend. The runtime loader, `stanbuild
//! artifacts` and the idempotence checks all rely on this convention.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::backend::BackendId;

/// Build report written next to the artifacts.
pub const BUILD_INFO_FILE: &str = "build-info.json";

/// Artifact file name for a backend and model.
pub fn artifact_name(backend: BackendId, model_name: &str) -> String {
    format!("{}_model.{}", model_name, backend.artifact_extension())
}

/// Artifact path for a backend and model inside `target_dir`.
pub fn artifact_path(target_dir: &Path, backend: BackendId, model_name: &str) -> PathBuf {
    target_dir.join(artifact_name(backend, model_name))
}

/// Backends with an artifact for `model_name` present in `target_dir`.
pub fn available_backends(target_dir: &Path, model_name: &str) -> Vec<BackendId> {
    BackendId::ALL
        .into_iter()
        .filter(|id| artifact_path(target_dir, *id, model_name).is_file())
        .collect()
}

/// Every artifact in `target_dir`, whatever the model name.
///
/// Files matching `*_model.*` whose extension belongs to no backend are
/// ignored.
pub fn discover_artifacts(target_dir: &Path) -> Result<Vec<(BackendId, PathBuf)>> {
    let pattern = format!(
        "{}/*_model.*",
        glob::Pattern::escape(&target_dir.to_string_lossy())
    );

    let mut found = Vec::new();
    for entry in glob::glob(&pattern).with_context(|| format!("invalid glob pattern: {}", pattern))? {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!("glob error: {}", e);
                continue;
            }
        };
        if !path.is_file() {
            continue;
        }
        let backend = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(BackendId::from_artifact_extension);
        if let Some(backend) = backend {
            found.push((backend, path));
        }
    }

    found.sort();
    Ok(found)
}

/// Summary of one orchestration run, serialized to `build-info.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    /// Model name
    pub model: String,

    /// SHA-256 of the `.stan` source the artifacts were compiled from
    pub source_sha256: String,

    /// Backends built by this run, in build order
    pub backends: Vec<BuiltBackend>,
}

/// Artifacts produced by one backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltBackend {
    pub backend: BackendId,

    /// Artifact file names, relative to the target directory
    pub artifacts: Vec<String>,
}

impl BuildInfo {
    /// Write the report into `target_dir`.
    pub fn write(&self, target_dir: &Path) -> Result<PathBuf> {
        let path = target_dir.join(BUILD_INFO_FILE);
        let json = serde_json::to_string_pretty(self).context("failed to serialize build info")?;
        crate::util::fs::write_string(&path, &json)?;
        Ok(path)
    }

    /// Load the report from `target_dir`.
    pub fn load(target_dir: &Path) -> Result<Self> {
        let path = target_dir.join(BUILD_INFO_FILE);
        let contents = crate::util::fs::read_to_string(&path)?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))
    }
}
