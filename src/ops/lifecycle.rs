//! Lifecycle hooks - compile models before the default lifecycle action.
//!
//! ```text
//!   Idle ──► EnsureTargetDir ──► Orchestrate ──► DefaultLifecycleAction ──► Done
//!                                     │
//!                                     └──► Failed
//! ```
//!
//! In dry-run mode the hook goes straight from `Idle` to the default action,
//! which runs in its own dry-run mode. Nothing is created or compiled.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use crate::builder::BackendRegistry;
use crate::core::Workspace;
use crate::ops::orchestrate::{BuildReport, Orchestrator};
use crate::util::fs::ensure_dir;
use crate::util::shell::{Shell, Status};

/// States a lifecycle hook moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookState {
    Idle,
    EnsureTargetDir,
    Orchestrate,
    DefaultLifecycleAction,
    Done,
    Failed,
}

/// The default action a hook wraps.
pub trait LifecycleAction {
    /// Command name, for status output.
    fn name(&self) -> &'static str;

    /// Directory the models are compiled into.
    fn target_dir(&self, ws: &Workspace) -> PathBuf;

    /// Run the action.
    fn run(&self, ws: &Workspace, dry_run: bool) -> Result<()>;
}

/// Packaging into staging, the default action of `build`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageAction;

impl LifecycleAction for PackageAction {
    fn name(&self) -> &'static str {
        "build"
    }

    fn target_dir(&self, ws: &Workspace) -> PathBuf {
        ws.staging_model_target()
    }

    fn run(&self, ws: &Workspace, dry_run: bool) -> Result<()> {
        crate::ops::package::package(ws, dry_run)?;
        Ok(())
    }
}

/// Development link, the default action of `develop`.
#[derive(Debug, Clone, Default)]
pub struct DevelopAction {
    /// Where to write the link; defaults to `.stanbuild/develop`
    pub install_dir: Option<PathBuf>,
}

impl LifecycleAction for DevelopAction {
    fn name(&self) -> &'static str {
        "develop"
    }

    fn target_dir(&self, ws: &Workspace) -> PathBuf {
        ws.inplace_model_target()
    }

    fn run(&self, ws: &Workspace, dry_run: bool) -> Result<()> {
        crate::ops::develop::develop(ws, self.install_dir.as_deref(), dry_run)?;
        Ok(())
    }
}

/// Result of a completed hook.
#[derive(Debug, Clone)]
pub struct HookOutcome {
    /// Directory the models were (or would have been) compiled into
    pub target_dir: PathBuf,
    /// Orchestration result; `None` in dry-run mode
    pub report: Option<BuildReport>,
    /// States visited, in order
    pub trace: Vec<HookState>,
}

/// Runs the model build before a lifecycle command's default action.
pub struct LifecycleHook<'a, A: LifecycleAction> {
    ws: &'a Workspace,
    registry: &'a BackendRegistry,
    action: A,
    dry_run: bool,
    selection: Option<Vec<String>>,
    shell: Option<Arc<Shell>>,
    trace: Vec<HookState>,
}

impl<'a, A: LifecycleAction> LifecycleHook<'a, A> {
    /// Wrap `action` for the given workspace.
    pub fn new(ws: &'a Workspace, registry: &'a BackendRegistry, action: A) -> Self {
        LifecycleHook {
            ws,
            registry,
            action,
            dry_run: false,
            selection: None,
            shell: None,
            trace: vec![HookState::Idle],
        }
    }

    /// Enable dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Use a fixed backend selection instead of `STAN_BACKEND`.
    pub fn with_selection(mut self, names: Vec<String>) -> Self {
        self.selection = Some(names);
        self
    }

    /// Report progress through `shell`.
    pub fn with_shell(mut self, shell: Arc<Shell>) -> Self {
        self.shell = Some(shell);
        self
    }

    /// Current state.
    pub fn state(&self) -> HookState {
        self.trace.last().copied().unwrap_or(HookState::Idle)
    }

    /// States visited so far.
    pub fn trace(&self) -> &[HookState] {
        &self.trace
    }

    /// Run the hook.
    ///
    /// Orchestration errors are returned unchanged and the default action
    /// never runs after one.
    pub fn run(&mut self) -> Result<HookOutcome> {
        let target_dir = self.action.target_dir(self.ws);

        let report = if self.dry_run {
            tracing::info!(
                "dry run: skipping model build into {}",
                target_dir.display()
            );
            if let Some(shell) = &self.shell {
                shell.status(
                    Status::Skipped,
                    format!("model build for `{}` (dry run)", self.action.name()),
                );
            }
            None
        } else {
            match self.build_models(&target_dir) {
                Ok(report) => Some(report),
                Err(e) => {
                    self.transition(HookState::Failed);
                    return Err(e);
                }
            }
        };

        self.transition(HookState::DefaultLifecycleAction);
        if let Err(e) = self.action.run(self.ws, self.dry_run) {
            self.transition(HookState::Failed);
            return Err(e);
        }
        self.transition(HookState::Done);

        Ok(HookOutcome {
            target_dir,
            report,
            trace: self.trace.clone(),
        })
    }

    fn build_models(&mut self, target_dir: &Path) -> Result<BuildReport> {
        self.transition(HookState::EnsureTargetDir);
        ensure_dir(target_dir)?;

        self.transition(HookState::Orchestrate);
        let mut orchestrator = Orchestrator::new(self.registry, self.ws.model_source());
        if let Some(names) = &self.selection {
            orchestrator = orchestrator.with_selection(names.clone());
        }
        if let Some(shell) = &self.shell {
            orchestrator = orchestrator.with_shell(Arc::clone(shell));
        }

        Ok(orchestrator.run(target_dir)?)
    }

    fn transition(&mut self, next: HookState) {
        tracing::debug!("{} hook: {:?} -> {:?}", self.action.name(), self.state(), next);
        self.trace.push(next);
    }
}

/// Hook for `stanbuild build`: models into staging, then packaging.
pub fn build_hook<'a>(
    ws: &'a Workspace,
    registry: &'a BackendRegistry,
) -> LifecycleHook<'a, PackageAction> {
    LifecycleHook::new(ws, registry, PackageAction)
}

/// Hook for `stanbuild develop`: models in place, then the development link.
pub fn develop_hook<'a>(
    ws: &'a Workspace,
    registry: &'a BackendRegistry,
    install_dir: Option<PathBuf>,
) -> LifecycleHook<'a, DevelopAction> {
    LifecycleHook::new(ws, registry, DevelopAction { install_dir })
}
