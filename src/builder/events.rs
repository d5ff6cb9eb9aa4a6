//! Build event types for JSON output.
//!
//! These events are emitted on stdout when using `--message-format=json`,
//! one JSON object per line.
//!
//! # Event Types
//!
//! - `build-started`: Orchestration began for a target directory
//! - `model-artifact`: A backend finished and wrote its artifacts
//! - `build-finished`: Orchestration completed (success or failure)
//!
//! # Stability
//!
//! New fields may be added, but existing fields should not be removed or renamed.

use std::path::PathBuf;

use serde::Serialize;

use crate::builder::backend::BackendId;

/// A build event emitted during orchestration.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "reason")]
pub enum BuildEvent {
    /// Orchestration began.
    #[serde(rename = "build-started")]
    BuildStarted {
        /// Model name
        model: String,
        /// Directory receiving the artifacts
        target_dir: PathBuf,
        /// Selected backend names, as configured
        backends: Vec<String>,
    },

    /// A backend produced its artifacts.
    #[serde(rename = "model-artifact")]
    ModelArtifact {
        backend: BackendId,
        /// Model name
        model: String,
        /// Artifact paths
        filenames: Vec<PathBuf>,
    },

    /// Orchestration completed.
    #[serde(rename = "build-finished")]
    BuildFinished {
        /// Whether every selected backend built
        success: bool,
        /// Total duration in milliseconds
        duration_ms: u64,
        /// Number of backends built
        backends_built: usize,
    },
}
