//! Build orchestration - run every selected backend against a target dir.
//!
//! Backends build strictly in selection order, one at a time, and the first
//! failure aborts the run. Artifacts written by backends that already
//! finished are left in place.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::builder::artifacts::{BuildInfo, BuiltBackend};
use crate::builder::{BackendId, BackendRegistry, BuildError, BuildEvent, ConfigurationError};
use crate::core::ModelSource;
use crate::ops::selection::select;
use crate::util::shell::{Shell, Status};

/// Orchestration failure.
#[derive(Debug, Error)]
pub enum OrchestrateError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("failed to write build report")]
    Report(#[source] anyhow::Error),
}

/// Artifacts produced by one orchestration run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Backends in build order with their artifacts
    pub built: Vec<(BackendId, Vec<PathBuf>)>,
}

impl BuildReport {
    /// Check if a backend was built in this run.
    pub fn contains(&self, id: BackendId) -> bool {
        self.built.iter().any(|(built, _)| *built == id)
    }

    /// Backends built, in order.
    pub fn backends(&self) -> Vec<BackendId> {
        self.built.iter().map(|(id, _)| *id).collect()
    }

    /// Every artifact path, in build order.
    pub fn artifacts(&self) -> impl Iterator<Item = &Path> + '_ {
        self.built
            .iter()
            .flat_map(|(_, paths)| paths.iter().map(|p| p.as_path()))
    }
}

/// Runs the selected backends' builders for one model.
pub struct Orchestrator<'a> {
    registry: &'a BackendRegistry,
    model: ModelSource,
    /// Explicit selection; `None` reads `STAN_BACKEND` on every run
    selection: Option<Vec<String>>,
    shell: Option<Arc<Shell>>,
}

impl<'a> Orchestrator<'a> {
    /// Create an orchestrator for `model`.
    pub fn new(registry: &'a BackendRegistry, model: ModelSource) -> Self {
        Orchestrator {
            registry,
            model,
            selection: None,
            shell: None,
        }
    }

    /// Use a fixed selection list instead of the environment.
    pub fn with_selection(mut self, names: Vec<String>) -> Self {
        self.selection = Some(names);
        self
    }

    /// Report progress through `shell`.
    pub fn with_shell(mut self, shell: Arc<Shell>) -> Self {
        self.shell = Some(shell);
        self
    }

    /// Build every selected backend into `target_dir`.
    ///
    /// `target_dir` must already exist.
    pub fn run(&self, target_dir: &Path) -> Result<BuildReport, OrchestrateError> {
        let names = self.selection.clone().unwrap_or_else(select);
        let start = Instant::now();

        tracing::info!(
            "building `{}` model for [{}] into {}",
            self.model.name(),
            names.join(","),
            target_dir.display()
        );
        self.emit(&BuildEvent::BuildStarted {
            model: self.model.name().to_string(),
            target_dir: target_dir.to_path_buf(),
            backends: names.clone(),
        });

        let mut report = BuildReport::default();
        let result = self.build_all(&names, target_dir, &mut report);

        self.emit(&BuildEvent::BuildFinished {
            success: result.is_ok(),
            duration_ms: start.elapsed().as_millis() as u64,
            backends_built: report.built.len(),
        });
        result?;

        self.write_build_info(target_dir, &report)
            .map_err(OrchestrateError::Report)?;

        Ok(report)
    }

    fn build_all(
        &self,
        names: &[String],
        target_dir: &Path,
        report: &mut BuildReport,
    ) -> Result<(), OrchestrateError> {
        for name in names {
            let builder = self.registry.resolve(name)?;
            let id = builder.backend();

            if report.contains(id) {
                tracing::debug!("`{}` already built in this run, skipping duplicate", id);
                continue;
            }

            let span = self.shell.as_ref().map(|shell| {
                shell.span(
                    Status::Compiling,
                    format!("`{}` model with {}", self.model.name(), id),
                )
            });

            let artifacts = builder.build(target_dir, &self.model)?;

            if let Some(span) = span {
                span.finish_with_message(format!("{} model", id));
            }
            self.emit(&BuildEvent::ModelArtifact {
                backend: id,
                model: self.model.name().to_string(),
                filenames: artifacts.clone(),
            });

            report.built.push((id, artifacts));
        }

        Ok(())
    }

    fn write_build_info(&self, target_dir: &Path, report: &BuildReport) -> anyhow::Result<()> {
        let info = BuildInfo {
            model: self.model.name().to_string(),
            source_sha256: self.model.digest()?,
            backends: report
                .built
                .iter()
                .map(|(id, paths)| BuiltBackend {
                    backend: *id,
                    artifacts: paths
                        .iter()
                        .map(|p| crate::util::fs::relative_path(target_dir, p))
                        .map(|p| p.to_string_lossy().into_owned())
                        .collect(),
                })
                .collect(),
        };
        info.write(target_dir)?;
        Ok(())
    }

    fn emit(&self, event: &BuildEvent) {
        if let Some(shell) = &self.shell {
            shell.json_event(event);
        }
    }
}
