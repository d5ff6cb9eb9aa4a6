//! Backend identifiers - the closed set of model-compilation backends.
//!
//! Each backend is a toolchain able to compile the same Stan model into a
//! runtime-loadable artifact. The set is fixed at compile time; adding a
//! backend means adding a variant here and a builder in the registry.

use serde::{Deserialize, Serialize};

/// Unique identifier for a model-compilation backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BackendId {
    /// PyStan, driven through a Python interpreter
    #[serde(rename = "PYSTAN")]
    PyStan,
    /// CmdStan, driven through `make` inside the CmdStan home
    #[serde(rename = "CMDSTANPY")]
    CmdStanPy,
}

impl BackendId {
    /// Every supported backend, in registry order.
    pub const ALL: [BackendId; 2] = [BackendId::PyStan, BackendId::CmdStanPy];

    /// Backend built when no selection is configured.
    pub const DEFAULT: BackendId = BackendId::PyStan;

    /// Get the backend name as it appears in `STAN_BACKEND`.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendId::PyStan => "PYSTAN",
            BackendId::CmdStanPy => "CMDSTANPY",
        }
    }

    /// File extension of the compiled artifact this backend produces.
    ///
    /// Part of the on-disk contract with the runtime loader.
    pub fn artifact_extension(&self) -> &'static str {
        match self {
            BackendId::PyStan => "pkl",
            BackendId::CmdStanPy => "bin",
        }
    }

    /// Look up the backend that owns an artifact extension.
    pub fn from_artifact_extension(ext: &str) -> Option<BackendId> {
        BackendId::ALL
            .into_iter()
            .find(|id| id.artifact_extension() == ext)
    }

    /// Short human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            BackendId::PyStan => "PyStan model pickled through the Python interpreter",
            BackendId::CmdStanPy => "CmdStan executable compiled with make",
        }
    }

    /// Comma-separated list of supported names, for error messages.
    pub fn supported_names() -> String {
        BackendId::ALL
            .iter()
            .map(|id| id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for BackendId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BackendId {
    type Err = BackendIdParseError;

    /// Names match exactly; `pystan` is not `PYSTAN`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BackendId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| BackendIdParseError(s.to_string()))
    }
}

/// Error returned when parsing an invalid backend name.
#[derive(Debug, Clone)]
pub struct BackendIdParseError(pub String);

impl std::fmt::Display for BackendIdParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid backend '{}', valid values: {}",
            self.0,
            BackendId::supported_names()
        )
    }
}

impl std::error::Error for BackendIdParseError {}
