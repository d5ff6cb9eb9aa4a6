//! Global context for stanbuild operations.
//!
//! Provides centralized access to the working directory, global paths and
//! the shared shell.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::core::workspace::{find_manifest as ws_find_manifest, ManifestError};
use crate::util::config::{global_config_path, load_config, Config};
use crate::util::shell::Shell;

/// Global context containing paths and output settings.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Global config file (~/.stanbuild/config.toml), if a home exists
    global_config: Option<PathBuf>,

    /// Shared output shell
    shell: Arc<Shell>,

    /// Whether lifecycle commands run without side effects
    dry_run: bool,
}

impl GlobalContext {
    /// Create a new GlobalContext with defaults.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        GlobalContext {
            cwd,
            global_config: global_config_path(),
            shell: Arc::new(Shell::default()),
            dry_run: false,
        }
    }

    /// Use the given shell for output.
    pub fn with_shell(mut self, shell: Shell) -> Self {
        self.shell = Arc::new(shell);
        self
    }

    /// Set dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the shell.
    pub fn shell(&self) -> &Arc<Shell> {
        &self.shell
    }

    /// Check if dry-run mode is enabled.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Load merged global + project configuration.
    pub fn load_config(&self, project_config: &Path) -> Config {
        load_config(self.global_config.as_deref(), project_config)
    }

    /// Find Stanbuild.toml starting from cwd and searching upward.
    pub fn find_manifest(&self) -> Result<PathBuf, ManifestError> {
        let mut current = self.cwd.clone();
        loop {
            match ws_find_manifest(&current) {
                Ok(path) => return Ok(path),
                Err(ManifestError::NotFound { .. }) => {
                    if !current.pop() {
                        return Err(ManifestError::NotFound {
                            dir: self.cwd.clone(),
                        });
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MANIFEST_NAME;
    use tempfile::TempDir;

    #[test]
    fn test_find_manifest_searches_upward() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(MANIFEST_NAME), "").unwrap();
        let nested = tmp.path().join("fbprophet").join("tests");
        std::fs::create_dir_all(&nested).unwrap();

        let ctx = GlobalContext::with_cwd(nested);
        assert_eq!(
            ctx.find_manifest().unwrap(),
            tmp.path().join(MANIFEST_NAME)
        );
    }

    #[test]
    fn test_find_manifest_not_found_reports_cwd() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());

        // A Stanbuild.toml further up the real filesystem would be found; the
        // temp dir root is assumed clean.
        if let Err(ManifestError::NotFound { dir }) = ctx.find_manifest() {
            assert_eq!(dir, tmp.path());
        }
    }

    #[test]
    fn test_dry_run_flag() {
        let ctx = GlobalContext::with_cwd(PathBuf::from("/")).with_dry_run(true);
        assert!(ctx.is_dry_run());
    }
}
