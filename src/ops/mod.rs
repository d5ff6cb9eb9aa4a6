//! High-level operations.
//!
//! This module contains the implementation of stanbuild commands.

pub mod clean;
pub mod develop;
pub mod lifecycle;
pub mod orchestrate;
pub mod package;
pub mod sandbox;
pub mod selection;

pub use clean::{clean, CleanOptions};
pub use develop::develop;
pub use lifecycle::{
    build_hook, develop_hook, DevelopAction, HookOutcome, HookState, LifecycleAction,
    LifecycleHook, PackageAction,
};
pub use orchestrate::{BuildReport, OrchestrateError, Orchestrator};
pub use package::{package, PackageResult};
pub use sandbox::{
    ActivationContext, CommandTestExecutor, ResolutionGuard, SandboxError, SandboxedTestRunner,
    TestExecutor, TestResult, TestSelector,
};
pub use selection::{select, select_from, BACKEND_ENV};
