//! Test fixtures for common test scenarios.
//!
//! [`PackageFixture`] writes a package skeleton to disk: a manifest, a
//! package source directory and a Stan model for every platform family.

use std::path::{Path, PathBuf};

use crate::core::MANIFEST_NAME;

/// A minimal Stan program; fake builders never compile it.
pub const STAN_PROGRAM: &str = r#"data {
  int T;
  vector[T] y;
}
parameters {
  real mu;
}
model {
  y ~ normal(mu, 1);
}
"#;

/// Fixture for a package with one Stan model.
#[derive(Debug, Clone)]
pub struct PackageFixture {
    /// Distribution name, also the package source directory
    pub name: String,
    /// Distribution version
    pub version: String,
    /// Model name
    pub model: String,
    /// Extra lines appended to the manifest
    pub extra_manifest: String,
}

impl PackageFixture {
    /// Create a fixture for `name` at version 0.6.1 with a `prophet` model.
    pub fn new(name: impl Into<String>) -> Self {
        PackageFixture {
            name: name.into(),
            version: "0.6.1".to_string(),
            model: "prophet".to_string(),
            extra_manifest: String::new(),
        }
    }

    /// Set the version.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Append raw TOML to the manifest.
    pub fn manifest_extra(mut self, toml: impl Into<String>) -> Self {
        self.extra_manifest.push_str(&toml.into());
        self
    }

    /// Manifest contents.
    pub fn manifest(&self) -> String {
        format!(
            "[package]\nname = \"{}\"\nversion = \"{}\"\n\n[models]\nname = \"{}\"\nsource = \"stan\"\n{}",
            self.name, self.version, self.model, self.extra_manifest
        )
    }

    /// Write the package skeleton under `root` and return the manifest path.
    pub fn write(&self, root: &Path) -> PathBuf {
        let pkg = root.join(&self.name);
        std::fs::create_dir_all(pkg.join("tests")).unwrap();
        std::fs::write(pkg.join("__init__.py"), "").unwrap();
        std::fs::write(pkg.join("forecaster.py"), "class Prophet:\n    pass\n").unwrap();
        std::fs::write(pkg.join("tests/__init__.py"), "").unwrap();

        for platform in ["unix", "win"] {
            let dir = root.join("stan").join(platform);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join(format!("{}.stan", self.model)), STAN_PROGRAM).unwrap();
        }

        let manifest_path = root.join(MANIFEST_NAME);
        std::fs::write(&manifest_path, self.manifest()).unwrap();
        manifest_path
    }
}
