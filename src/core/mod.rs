//! Core data structures for stanbuild.
//!
//! This module contains the foundational types used throughout stanbuild:
//! - Package manifest and identity
//! - Platform family and model source location
//! - Workspace paths

pub mod manifest;
pub mod model;
pub mod package;
pub mod platform;
pub mod workspace;

pub use manifest::Manifest;
pub use model::ModelSource;
pub use package::PackageIdentity;
pub use platform::Platform;
pub use workspace::{find_manifest, ManifestError, Workspace, MANIFEST_NAME};
