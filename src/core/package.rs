//! Package identity - WHAT distribution (name + version).
//!
//! The identity is written as distribution metadata next to the packaged
//! sources and required back, exactly, when tests activate the build.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use semver::Version;

/// Metadata format version written into `METADATA`.
const METADATA_VERSION: &str = "2.1";

/// Name and version of a distribution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageIdentity {
    name: String,
    version: Version,
}

impl PackageIdentity {
    /// Create a new identity.
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        PackageIdentity {
            name: name.into(),
            version,
        }
    }

    /// Get the distribution name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the distribution version.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Name normalized for comparison: lowercase, `-` and `.` folded to `_`.
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    /// Directory name of the metadata directory, `<name>-<version>.dist-info`.
    pub fn dist_info_dir_name(&self) -> String {
        format!("{}-{}.dist-info", self.normalized_name(), self.version)
    }

    /// Write `<dir>/<name>-<version>.dist-info/METADATA`.
    pub fn write_metadata(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(self.dist_info_dir_name()).join("METADATA");
        let contents = format!(
            "Metadata-Version: {}\nName: {}\nVersion: {}\n",
            METADATA_VERSION, self.name, self.version
        );
        crate::util::fs::write_string(&path, &contents)?;
        Ok(path)
    }

    /// Read a `METADATA` file back into an identity.
    ///
    /// Returns the name and the raw version string; the version may not be
    /// semver when the file was written by another tool.
    pub fn read_metadata(path: &Path) -> Result<(String, String)> {
        let contents = crate::util::fs::read_to_string(path)?;
        let mut name = None;
        let mut version = None;

        for line in contents.lines() {
            if let Some(value) = line.strip_prefix("Name:") {
                name = Some(value.trim().to_string());
            } else if let Some(value) = line.strip_prefix("Version:") {
                version = Some(value.trim().to_string());
            }
        }

        let name = name.with_context(|| format!("missing `Name` in {}", path.display()))?;
        let version =
            version.with_context(|| format!("missing `Version` in {}", path.display()))?;
        Ok((name, version))
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}", self.name, self.version)
    }
}

/// Normalize a distribution name for comparison.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase().replace(['-', '.'], "_")
}
