//! CmdStan backend.
//!
//! CmdStan builds a model executable with `make <path/to/model>` run from the
//! CmdStan home. The model is staged into a scratch directory under the
//! target, compiled there, and the executable copied to
//! `<model>_model.bin`.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};

use crate::builder::artifacts::artifact_path;
use crate::builder::backend::BackendId;
use crate::builder::errors::BuildError;
use crate::builder::model_builder::{BackendAvailability, ModelBuilder};
use crate::core::{ModelSource, Platform};
use crate::util::fs::{copy_file, ensure_dir, remove_dir_all_if_exists};
use crate::util::process::{find_make, ProcessBuilder};

/// Environment variable pointing at the CmdStan installation.
pub const CMDSTAN_ENV: &str = "CMDSTAN";

/// Scratch directory created inside the target during a build.
const SCRATCH_DIR: &str = ".cmdstan-build";

/// CmdStan model builder.
#[derive(Debug, Clone)]
pub struct CmdStanBuilder {
    /// Configured CmdStan home; `None` reads `$CMDSTAN`
    home: Option<PathBuf>,

    /// Configured make; `None` searches PATH
    make: Option<PathBuf>,

    platform: Platform,
}

impl CmdStanBuilder {
    /// Create a builder using `$CMDSTAN` and make from PATH.
    pub fn new() -> Self {
        CmdStanBuilder {
            home: None,
            make: None,
            platform: Platform::host(),
        }
    }

    /// Use a specific CmdStan home.
    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    /// Use a specific make.
    pub fn with_make(mut self, make: Option<PathBuf>) -> Self {
        self.make = make;
        self
    }

    fn home(&self) -> Option<PathBuf> {
        self.home
            .clone()
            .or_else(|| std::env::var_os(CMDSTAN_ENV).map(PathBuf::from))
    }

    fn make(&self) -> Option<PathBuf> {
        self.make.clone().or_else(find_make)
    }

    /// A CmdStan home is recognised by its top-level makefile.
    fn is_cmdstan_home(path: &Path) -> bool {
        path.join("makefile").is_file() || path.join("Makefile").is_file()
    }

    /// Command line compiling the staged model at `exe_target`.
    fn compile_command(&self, make: &Path, home: &Path, exe_target: &Path) -> ProcessBuilder {
        ProcessBuilder::new(make).arg(exe_target).cwd(home)
    }

    fn build_in_scratch(
        &self,
        target_dir: &Path,
        model: &ModelSource,
        scratch: &Path,
    ) -> anyhow::Result<PathBuf> {
        let home = self
            .home()
            .ok_or_else(|| anyhow!("CmdStan home not configured; set `{}`", CMDSTAN_ENV))?;
        if !Self::is_cmdstan_home(&home) {
            anyhow::bail!("`{}` is not a CmdStan installation", home.display());
        }
        let make = self.make().ok_or_else(|| anyhow!("`make` not found"))?;

        remove_dir_all_if_exists(scratch)?;
        ensure_dir(scratch)?;
        let staged = scratch.join(format!("{}.stan", model.name()));
        copy_file(&model.stan_file(), &staged)?;

        let exe_target = scratch.join(format!("{}{}", model.name(), self.platform.exe_suffix()));
        self.compile_command(&make, &home, &exe_target)
            .exec_and_check()?;

        let artifact = artifact_path(target_dir, self.backend(), model.name());
        copy_file(&exe_target, &artifact)
            .with_context(|| format!("CmdStan did not produce {}", exe_target.display()))?;
        Ok(artifact)
    }
}

impl Default for CmdStanBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelBuilder for CmdStanBuilder {
    fn backend(&self) -> BackendId {
        BackendId::CmdStanPy
    }

    fn availability(&self) -> BackendAvailability {
        let hint = format!(
            "Install CmdStan and set `{}` or `toolchain.cmdstan` in .stanbuild/config.toml",
            CMDSTAN_ENV
        );

        match self.home() {
            Some(home) if Self::is_cmdstan_home(&home) => {
                if self.make().is_some() {
                    BackendAvailability::Available { location: home }
                } else {
                    BackendAvailability::NotInstalled {
                        tool: "make".to_string(),
                        install_hint: "Install GNU make".to_string(),
                    }
                }
            }
            _ => BackendAvailability::NotInstalled {
                tool: "CmdStan".to_string(),
                install_hint: hint,
            },
        }
    }

    fn build(&self, target_dir: &Path, model: &ModelSource) -> Result<Vec<PathBuf>, BuildError> {
        let stan_file = model.stan_file();
        if !stan_file.is_file() {
            return Err(BuildError::new(
                self.backend(),
                anyhow!("model source not found: {}", stan_file.display()),
            ));
        }

        let scratch = target_dir.join(SCRATCH_DIR);
        tracing::debug!(
            "CmdStan: compiling {} in {}",
            stan_file.display(),
            scratch.display()
        );

        let result = self.build_in_scratch(target_dir, model, &scratch);

        if let Err(e) = remove_dir_all_if_exists(&scratch) {
            tracing::warn!("{:#}", e);
        }

        result
            .map(|artifact| vec![artifact])
            .map_err(|e| BuildError::new(self.backend(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_model(root: &Path) -> ModelSource {
        let src = root.join("stan").join("unix");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("prophet.stan"), "model {}").unwrap();
        ModelSource::new("prophet", src)
    }

    #[test]
    fn test_cmdstan_builder_backend() {
        assert_eq!(CmdStanBuilder::new().backend(), BackendId::CmdStanPy);
    }

    #[test]
    fn test_compile_command_runs_in_home() {
        let builder = CmdStanBuilder::new();
        let cmd = builder.compile_command(
            Path::new("/usr/bin/make"),
            Path::new("/opt/cmdstan"),
            Path::new("/out/.cmdstan-build/prophet"),
        );

        assert_eq!(cmd.get_program(), Path::new("/usr/bin/make"));
        assert_eq!(cmd.get_args().len(), 1);
        assert_eq!(cmd.get_args()[0], "/out/.cmdstan-build/prophet");
    }

    #[test]
    fn test_not_a_cmdstan_home() {
        let tmp = TempDir::new().unwrap();
        let model = write_model(tmp.path());
        let out = tmp.path().join("out");
        std::fs::create_dir_all(&out).unwrap();

        let err = CmdStanBuilder::new()
            .with_home(Some(tmp.path().join("empty")))
            .with_make(Some(PathBuf::from("make")))
            .build(&out, &model)
            .unwrap_err();

        assert_eq!(err.backend, BackendId::CmdStanPy);
        assert!(err.cause.to_string().contains("is not a CmdStan installation"));
        assert!(!out.join(SCRATCH_DIR).exists());
        assert!(!out.join("prophet_model.bin").exists());
    }

    #[test]
    fn test_missing_model_source() {
        let tmp = TempDir::new().unwrap();
        let model = ModelSource::new("prophet", tmp.path().join("nowhere"));

        let err = CmdStanBuilder::new().build(tmp.path(), &model).unwrap_err();
        assert!(err.cause.to_string().contains("model source not found"));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_make_removes_scratch() {
        let tmp = TempDir::new().unwrap();
        let model = write_model(tmp.path());
        let home = tmp.path().join("cmdstan");
        std::fs::create_dir_all(&home).unwrap();
        std::fs::write(home.join("makefile"), "").unwrap();
        let out = tmp.path().join("out");
        std::fs::create_dir_all(&out).unwrap();

        // `false` ignores its arguments and exits 1.
        let err = CmdStanBuilder::new()
            .with_home(Some(home))
            .with_make(Some(PathBuf::from("false")))
            .build(&out, &model)
            .unwrap_err();

        assert!(err.cause.to_string().contains("failed with exit code"));
        assert!(!out.join(SCRATCH_DIR).exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_stale_scratch_is_not_reused() {
        let tmp = TempDir::new().unwrap();
        let model = write_model(tmp.path());
        let home = tmp.path().join("cmdstan");
        std::fs::create_dir_all(&home).unwrap();
        std::fs::write(home.join("makefile"), "").unwrap();
        let out = tmp.path().join("out");
        let stale = out.join(SCRATCH_DIR);
        std::fs::create_dir_all(&stale).unwrap();
        std::fs::write(stale.join("prophet"), "old executable").unwrap();

        // `true` succeeds without compiling anything.
        let err = CmdStanBuilder::new()
            .with_home(Some(home))
            .with_make(Some(PathBuf::from("true")))
            .build(&out, &model)
            .unwrap_err();

        assert!(err.cause.to_string().contains("CmdStan did not produce"));
        assert!(!out.join("prophet_model.bin").exists());
        assert!(!stale.exists());
    }

    #[test]
    fn test_availability_without_home() {
        let tmp = TempDir::new().unwrap();
        let availability = CmdStanBuilder::new()
            .with_home(Some(tmp.path().to_path_buf()))
            .availability();
        assert!(!availability.is_available());
    }
}
