//! Subprocess execution utilities.
//!
//! Toolchains and test runners are opaque subprocesses; this module builds
//! their command lines and turns non-zero exits into errors that carry the
//! command and its stderr.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output, Stdio};

use anyhow::{bail, Context, Result};

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<OsString>,
    env: BTreeMap<String, OsString>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_os_string()));
        self
    }

    /// Set an environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl AsRef<OsStr>) -> Self {
        self.env.insert(key.into(), value.as_ref().to_os_string());
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Get the program path.
    pub fn get_program(&self) -> &Path {
        &self.program
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Get an environment override.
    pub fn get_env(&self, key: &str) -> Option<&OsStr> {
        self.env.get(key).map(|v| v.as_os_str())
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Execute the command with captured output and wait for completion.
    pub fn exec(&self) -> Result<Output> {
        tracing::debug!("running `{}`", self.display_command());

        let output = self
            .build_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .with_context(|| format!("failed to spawn `{}`", self.program.display()))?;

        Ok(output)
    }

    /// Execute and require success.
    pub fn exec_and_check(&self) -> Result<Output> {
        let output = self.exec()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "`{}` failed with exit code {:?}\n{}",
                self.display_command(),
                output.status.code(),
                stderr.trim_end()
            );
        }
        Ok(output)
    }

    /// Execute with inherited stdio and return the exit status.
    pub fn status(&self) -> Result<ExitStatus> {
        tracing::debug!("running `{}`", self.display_command());

        self.build_command()
            .status()
            .with_context(|| format!("failed to execute `{}`", self.program.display()))
    }

    /// Display the command for error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().map(|a| {
            let arg = a.to_string_lossy();
            if arg.contains('\n') {
                "<script>".to_string()
            } else {
                arg.into_owned()
            }
        }));
        parts.join(" ")
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Find a Python interpreter.
pub fn find_python() -> Option<PathBuf> {
    // Check PYTHON environment variable first
    if let Ok(python) = std::env::var("PYTHON") {
        if let Some(path) = find_executable(&python) {
            return Some(path);
        }
    }

    ["python3", "python"]
        .iter()
        .find_map(|name| find_executable(name))
}

/// Find GNU make.
pub fn find_make() -> Option<PathBuf> {
    if let Ok(make) = std::env::var("MAKE") {
        if let Some(path) = find_executable(&make) {
            return Some(path);
        }
    }

    ["make", "mingw32-make", "gmake"]
        .iter()
        .find_map(|name| find_executable(name))
}
