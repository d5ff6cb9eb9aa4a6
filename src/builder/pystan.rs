//! PyStan backend.
//!
//! Compiles the model through `pystan.StanModel` in a Python interpreter and
//! pickles the compiled model into `<model>_model.pkl`.

use std::path::{Path, PathBuf};

use anyhow::anyhow;

use crate::builder::artifacts::artifact_path;
use crate::builder::backend::BackendId;
use crate::builder::errors::BuildError;
use crate::builder::model_builder::{BackendAvailability, ModelBuilder};
use crate::core::ModelSource;
use crate::util::process::{find_python, ProcessBuilder};

/// Script run as `python -c SCRIPT <stan file> <model name> <artifact>`.
const COMPILE_SCRIPT: &str = r#"
import pickle
import sys

import pystan

stan_file, model_name, target = sys.argv[1:4]
with open(stan_file) as f:
    model_code = f.read()
sm = pystan.StanModel(model_code=model_code, model_name=model_name)
with open(target, "wb") as f:
    pickle.dump(sm, f, protocol=pickle.HIGHEST_PROTOCOL)
"#;

/// PyStan model builder.
#[derive(Debug, Clone, Default)]
pub struct PyStanBuilder {
    /// Configured interpreter; `None` searches PATH
    python: Option<PathBuf>,
}

impl PyStanBuilder {
    /// Create a builder that finds Python on PATH.
    pub fn new() -> Self {
        PyStanBuilder { python: None }
    }

    /// Use a specific interpreter.
    pub fn with_python(mut self, python: Option<PathBuf>) -> Self {
        self.python = python;
        self
    }

    fn python(&self) -> Option<PathBuf> {
        self.python.clone().or_else(find_python)
    }

    /// Command line compiling `model` into `artifact`.
    fn compile_command(&self, python: &Path, model: &ModelSource, artifact: &Path) -> ProcessBuilder {
        ProcessBuilder::new(python)
            .arg("-c")
            .arg(COMPILE_SCRIPT)
            .arg(model.stan_file())
            .arg(model.name())
            .arg(artifact)
            .cwd(model.dir())
    }
}

impl ModelBuilder for PyStanBuilder {
    fn backend(&self) -> BackendId {
        BackendId::PyStan
    }

    fn availability(&self) -> BackendAvailability {
        match self.python() {
            Some(location) => BackendAvailability::Available { location },
            None => BackendAvailability::NotInstalled {
                tool: "python".to_string(),
                install_hint: "Install Python 3 with `pip install pystan`, or set \
                               `toolchain.python` in .stanbuild/config.toml"
                    .to_string(),
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

        let python = self.python().ok_or_else(|| {
            BuildError::new(self.backend(), anyhow!("Python interpreter not found"))
        })?;

        let artifact = artifact_path(target_dir, self.backend(), model.name());
        tracing::debug!(
            "PyStan: compiling {} -> {}",
            stan_file.display(),
            artifact.display()
        );

        self.compile_command(&python, model, &artifact)
            .exec_and_check()
            .map_err(|e| BuildError::new(self.backend(), e))?;

        if !artifact.is_file() {
            return Err(BuildError::new(
                self.backend(),
                anyhow!("PyStan exited cleanly but wrote no {}", artifact.display()),
            ));
        }

        Ok(vec![artifact])
    }
}
