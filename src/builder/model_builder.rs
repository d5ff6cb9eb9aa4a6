//! ModelBuilder trait definition.
//!
//! The ModelBuilder trait is the capability every backend implements: given
//! a target directory and a model source, write compiled artifacts.

use std::path::{Path, PathBuf};

use crate::builder::backend::BackendId;
use crate::builder::errors::BuildError;
use crate::core::ModelSource;

/// Backend toolchain availability status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendAvailability {
    /// Toolchain found
    Available {
        /// What was found (interpreter path, CmdStan home, ...)
        location: PathBuf,
    },

    /// Toolchain is not installed or not configured
    NotInstalled {
        /// Name of the missing tool
        tool: String,
        /// Hint for how to install or configure it
        install_hint: String,
    },
}

impl BackendAvailability {
    /// Check if the toolchain is available.
    pub fn is_available(&self) -> bool {
        matches!(self, BackendAvailability::Available { .. })
    }

    /// Get error message if not available.
    pub fn error_message(&self) -> Option<String> {
        match self {
            BackendAvailability::Available { .. } => None,
            BackendAvailability::NotInstalled { tool, install_hint } => {
                Some(format!("{} not found. {}", tool, install_hint))
            }
        }
    }
}

/// Trait for model-compilation backends.
///
/// Implementations must write artifacts named by
/// [`artifact_name`](crate::builder::artifacts::artifact_name) so the runtime
/// loader can tell backends apart, and must never read anything a previous
/// run left in `target_dir`.
pub trait ModelBuilder {
    /// The backend this builder implements.
    fn backend(&self) -> BackendId;

    /// Probe the toolchain without building anything.
    fn availability(&self) -> BackendAvailability;

    /// Compile `model` into `target_dir`, returning the artifacts written.
    ///
    /// `target_dir` must exist. Blocks until the toolchain exits.
    fn build(&self, target_dir: &Path, model: &ModelSource) -> Result<Vec<PathBuf>, BuildError>;
}
