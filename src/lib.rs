//! stanbuild - compile Stan models before packaging, developing or testing
//!
//! This crate provides the core library functionality for stanbuild:
//! the backend registry, model-build orchestration, the lifecycle hooks
//! around `build` and `develop`, and sandboxed test runs against the staged
//! package.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

/// Test utilities and fakes for stanbuild unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a recording model builder and package
/// fixtures.
#[cfg(test)]
pub mod test_support;

pub use builder::{BackendId, BackendRegistry, BuildError, ConfigurationError, ModelBuilder};
pub use core::{Manifest, ModelSource, PackageIdentity, Workspace};
pub use ops::{Orchestrator, SandboxedTestRunner};
pub use util::context::GlobalContext;
