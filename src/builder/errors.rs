//! Error types for backend resolution and model builds.

use thiserror::Error;

use crate::builder::backend::BackendId;

/// The backend selection or package activation cannot be satisfied.
///
/// Always fatal to the current lifecycle command.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("unsupported Stan backend `{name}` (supported: {supported})")]
    UnknownBackend { name: String, supported: String },

    #[error("package `{name} {version}` not found on the search path")]
    PackageNotFound { name: String, version: String },

    #[error("version mismatch for `{name}`: required {required}, found {found}")]
    VersionMismatch {
        name: String,
        required: String,
        found: String,
    },
}

impl ConfigurationError {
    /// Unknown backend name, listing the supported set.
    pub fn unknown_backend(name: impl Into<String>) -> Self {
        ConfigurationError::UnknownBackend {
            name: name.into(),
            supported: BackendId::supported_names(),
        }
    }
}

/// A backend's toolchain failed to compile the model.
#[derive(Debug, Error)]
#[error("failed to build `{backend}` model")]
pub struct BuildError {
    pub backend: BackendId,
    #[source]
    pub cause: anyhow::Error,
}

impl BuildError {
    pub fn new(backend: BackendId, cause: impl Into<anyhow::Error>) -> Self {
        BuildError {
            backend,
            cause: cause.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_backend_names_value() {
        let err = ConfigurationError::unknown_backend("backendX");
        let msg = err.to_string();
        assert!(msg.contains("`backendX`"));
        assert!(msg.contains("PYSTAN, CMDSTANPY"));
    }

    #[test]
    fn test_build_error_chain() {
        let err = BuildError::new(BackendId::CmdStanPy, anyhow::anyhow!("make exited with 2"));
        assert_eq!(err.to_string(), "failed to build `CMDSTANPY` model");

        let chained = format!("{:#}", anyhow::Error::new(err));
        assert!(chained.contains("make exited with 2"));
    }
}
