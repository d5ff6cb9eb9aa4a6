//! Process-wide module resolution state and its scoped guard.
//!
//! Two pieces of state decide which distribution a test run imports: the
//! search-path environment variable (inherited by every child process) and
//! the cache of distributions activated so far. [`ResolutionGuard`] locks
//! both, snapshots them, and puts the snapshot back when it goes away,
//! whether the sandboxed run returned, failed or panicked.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard};

use thiserror::Error;

use crate::builder::ConfigurationError;
use crate::core::package::{normalize_name, PackageIdentity};

/// Distributions activated in this process, by normalized name.
static LOADED: LazyLock<Mutex<LoadedDistributions>> =
    LazyLock::new(|| Mutex::new(LoadedDistributions::default()));

/// Sandbox failure.
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("failed to restore `{var}` and the loaded distribution cache after the test run")]
    RestoreFailed { var: String },

    #[error("cannot add {} to `{var}`", .path.display())]
    InvalidSearchPath {
        var: String,
        path: PathBuf,
        #[source]
        source: std::env::JoinPathsError,
    },
}

/// An activated distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    pub name: String,
    pub version: String,
    /// Search path entry it was found under
    pub location: PathBuf,
}

/// Cache of activated distributions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedDistributions {
    entries: BTreeMap<String, Distribution>,
}

impl LoadedDistributions {
    /// Look up a distribution by name.
    pub fn get(&self, name: &str) -> Option<&Distribution> {
        self.entries.get(&normalize_name(name))
    }

    /// Record an activated distribution, replacing any older entry.
    pub fn insert(&mut self, dist: Distribution) {
        self.entries.insert(normalize_name(&dist.name), dist);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Record a distribution as loaded outside any sandbox.
pub fn record_loaded(dist: Distribution) {
    lock_loaded().insert(dist);
}

/// Copy of the process-wide loaded cache.
pub fn loaded_snapshot() -> LoadedDistributions {
    lock_loaded().clone()
}

fn lock_loaded() -> MutexGuard<'static, LoadedDistributions> {
    // A panic inside a sandbox poisons the lock; the guard already restored the state.
    LOADED.lock().unwrap_or_else(|e| e.into_inner())
}

/// Resolution state captured on entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionSnapshot {
    pub search_path: Option<OsString>,
    pub loaded: LoadedDistributions,
}

/// Exclusive, scoped ownership of the process-wide resolution state.
///
/// Holding the guard blocks every other sandbox in the process. Dropping it
/// restores the snapshot; [`ResolutionGuard::restore`] does the same and
/// also verifies the result.
pub struct ResolutionGuard {
    var: String,
    loaded: MutexGuard<'static, LoadedDistributions>,
    snapshot: ResolutionSnapshot,
    restored: bool,
}

impl ResolutionGuard {
    /// Lock the resolution state and snapshot it.
    ///
    /// `var` names the search-path environment variable.
    pub fn acquire(var: impl Into<String>) -> Self {
        let var = var.into();
        let loaded = lock_loaded();
        let snapshot = ResolutionSnapshot {
            search_path: std::env::var_os(&var),
            loaded: loaded.clone(),
        };
        tracing::debug!("acquired resolution state for `{}`", var);

        ResolutionGuard {
            var,
            loaded,
            snapshot,
            restored: false,
        }
    }

    /// Search-path environment variable.
    pub fn var(&self) -> &str {
        &self.var
    }

    /// State captured on entry.
    pub fn snapshot(&self) -> &ResolutionSnapshot {
        &self.snapshot
    }

    /// Current search path entries.
    pub fn search_path(&self) -> Vec<PathBuf> {
        std::env::var_os(&self.var)
            .map(|value| std::env::split_paths(&value).collect())
            .unwrap_or_default()
    }

    /// Raw value of the search-path variable.
    pub fn search_path_value(&self) -> Option<OsString> {
        std::env::var_os(&self.var)
    }

    /// Insert `dir` at the front of the search path.
    pub fn prepend_search_path(&mut self, dir: &Path) -> Result<(), SandboxError> {
        let mut entries = vec![dir.to_path_buf()];
        entries.extend(self.search_path());
        let value = std::env::join_paths(entries).map_err(|source| {
            SandboxError::InvalidSearchPath {
                var: self.var.clone(),
                path: dir.to_path_buf(),
                source,
            }
        })?;
        std::env::set_var(&self.var, value);
        Ok(())
    }

    /// Forget every activated distribution.
    pub fn reset_loaded(&mut self) {
        self.loaded.clear();
    }

    /// Distributions activated so far.
    pub fn loaded(&self) -> &LoadedDistributions {
        &self.loaded
    }

    /// Start an explicit activation context on top of the current state.
    pub fn activation(&mut self) -> ActivationContext<'_> {
        ActivationContext {
            guard: self,
            activated: Vec::new(),
        }
    }

    /// Restore the snapshot and verify it took.
    pub fn restore(mut self) -> Result<(), SandboxError> {
        self.restore_state();
        let current = ResolutionSnapshot {
            search_path: std::env::var_os(&self.var),
            loaded: self.loaded.clone(),
        };
        if current != self.snapshot {
            return Err(SandboxError::RestoreFailed {
                var: self.var.clone(),
            });
        }
        tracing::debug!("restored resolution state for `{}`", self.var);
        Ok(())
    }

    fn restore_state(&mut self) {
        match &self.snapshot.search_path {
            Some(value) => std::env::set_var(&self.var, value),
            None => std::env::remove_var(&self.var),
        }
        *self.loaded = self.snapshot.loaded.clone();
        self.restored = true;
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        if !self.restored {
            self.restore_state();
            tracing::debug!("restored resolution state for `{}` on unwind", self.var);
        }
    }
}

/// Explicit activation context handed to the test executor.
///
/// `require` resolves a distribution on the search path and activates it
/// immediately; there is no deferred activation.
pub struct ActivationContext<'g> {
    guard: &'g mut ResolutionGuard,
    activated: Vec<Distribution>,
}

impl ActivationContext<'_> {
    /// Search-path environment variable.
    pub fn search_path_var(&self) -> &str {
        self.guard.var()
    }

    /// Raw search-path value to export to child processes.
    pub fn search_path_value(&self) -> Option<OsString> {
        self.guard.search_path_value()
    }

    /// Distributions activated through this context.
    pub fn activated(&self) -> &[Distribution] {
        &self.activated
    }

    /// Resolve `name` at exactly `version` and activate it.
    ///
    /// The first search-path entry carrying any version of the distribution
    /// decides; later entries are not consulted. A cached activation with a
    /// different version is a conflict.
    pub fn require(
        &mut self,
        name: &str,
        version: &semver::Version,
    ) -> Result<Distribution, ConfigurationError> {
        let required = version.to_string();

        if let Some(cached) = self.guard.loaded().get(name) {
            if cached.version != required {
                return Err(ConfigurationError::VersionMismatch {
                    name: name.to_string(),
                    required,
                    found: cached.version.clone(),
                });
            }
        }

        let candidates = self
            .guard
            .search_path()
            .iter()
            .map(|dir| find_distributions(dir, name))
            .find(|found| !found.is_empty())
            .ok_or_else(|| ConfigurationError::PackageNotFound {
                name: name.to_string(),
                version: required.clone(),
            })?;

        let dist = match candidates.iter().find(|d| d.version == required) {
            Some(exact) => exact.clone(),
            None => {
                return Err(ConfigurationError::VersionMismatch {
                    name: name.to_string(),
                    required,
                    found: candidates[0].version.clone(),
                })
            }
        };

        tracing::debug!(
            "activated {} {} from {}",
            dist.name,
            dist.version,
            dist.location.display()
        );
        self.guard.loaded.insert(dist.clone());
        self.activated.push(dist.clone());
        Ok(dist)
    }
}

/// Every `<dir>/<name>-*.dist-info/METADATA` for a distribution.
fn find_distributions(dir: &Path, name: &str) -> Vec<Distribution> {
    let normalized = normalize_name(name);
    let pattern = format!(
        "{}/{}-*.dist-info/METADATA",
        glob::Pattern::escape(&dir.to_string_lossy()),
        glob::Pattern::escape(&normalized)
    );

    let Ok(paths) = glob::glob(&pattern) else {
        return Vec::new();
    };

    paths
        .filter_map(|entry| entry.ok())
        .filter_map(|path| PackageIdentity::read_metadata(&path).ok())
        .filter(|(found, _)| normalize_name(found) == normalized)
        .map(|(name, version)| Distribution {
            name,
            version,
            location: dir.to_path_buf(),
        })
        .collect()
}
