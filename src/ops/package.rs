//! Default packaging step of `stanbuild build`.
//!
//! Copies the package sources into the staging directory and writes the
//! distribution metadata next to them. Compiled model artifacts already in
//! staging are kept; the in-place model target of the source tree is never
//! copied over them.

use std::path::PathBuf;

use anyhow::Result;

use crate::core::Workspace;
use crate::util::fs::{copy_package_tree, ensure_dir};

/// What the packaging step wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageResult {
    /// Package directory inside staging
    pub package_dir: PathBuf,
    /// Number of source files copied
    pub files_copied: usize,
    /// Written `METADATA` file
    pub metadata: PathBuf,
}

/// Stage the package into the workspace's staging directory.
///
/// With `dry_run` nothing is written and `None` is returned.
pub fn package(ws: &Workspace, dry_run: bool) -> Result<Option<PackageResult>> {
    let src = ws.package_source_dir();
    let package_dir = ws.build_lib().join(ws.manifest().package_source());

    if dry_run {
        tracing::info!(
            "would copy {} to {} (dry run)",
            src.display(),
            package_dir.display()
        );
        tracing::info!(
            "would write {} metadata to {} (dry run)",
            ws.identity(),
            ws.build_lib().display()
        );
        return Ok(None);
    }

    if !src.is_dir() {
        anyhow::bail!(
            "package source directory not found: {}\n\
             help: set `source` in the [package] table of the manifest",
            src.display()
        );
    }

    ensure_dir(&package_dir)?;
    let files_copied = copy_package_tree(&src, &package_dir, &[ws.inplace_model_target()])?;
    let metadata = ws.identity().write_metadata(ws.build_lib())?;

    tracing::info!(
        "staged {} files of {} into {}",
        files_copied,
        ws.identity(),
        ws.build_lib().display()
    );

    Ok(Some(PackageResult {
        package_dir,
        files_copied,
        metadata,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PackageIdentity;
    use crate::test_support::PackageFixture;
    use tempfile::TempDir;

    #[test]
    fn test_package_stages_sources_and_metadata() {
        let tmp = TempDir::new().unwrap();
        let manifest = PackageFixture::new("fbprophet").write(tmp.path());
        let ws = Workspace::new(&manifest).unwrap();

        let result = package(&ws, false).unwrap().unwrap();

        assert_eq!(result.package_dir, tmp.path().join("build/lib/fbprophet"));
        assert!(result.package_dir.join("forecaster.py").is_file());
        assert!(result.package_dir.join("tests/__init__.py").is_file());
        assert!(result
            .metadata
            .ends_with("fbprophet-0.6.1.dist-info/METADATA"));

        let (name, version) = PackageIdentity::read_metadata(&result.metadata).unwrap();
        assert_eq!(name, "fbprophet");
        assert_eq!(version, "0.6.1");
    }

    #[test]
    fn test_package_metadata_uses_manifest_version() {
        let tmp = TempDir::new().unwrap();
        let manifest = PackageFixture::new("fbprophet")
            .version("1.0.0")
            .write(tmp.path());
        let ws = Workspace::new(&manifest).unwrap();

        let result = package(&ws, false).unwrap().unwrap();

        assert!(result
            .metadata
            .ends_with("fbprophet-1.0.0.dist-info/METADATA"));
        let (_, version) = PackageIdentity::read_metadata(&result.metadata).unwrap();
        assert_eq!(version, "1.0.0");
    }

    #[test]
    fn test_package_keeps_built_artifacts() {
        let tmp = TempDir::new().unwrap();
        let manifest = PackageFixture::new("fbprophet").write(tmp.path());
        let ws = Workspace::new(&manifest).unwrap();

        let inplace = ws.inplace_model_target();
        std::fs::create_dir_all(&inplace).unwrap();
        std::fs::write(inplace.join("prophet_model.pkl"), "stale").unwrap();

        let staged = ws.staging_model_target();
        std::fs::create_dir_all(&staged).unwrap();
        std::fs::write(staged.join("prophet_model.pkl"), "fresh").unwrap();

        package(&ws, false).unwrap();

        assert_eq!(
            std::fs::read_to_string(staged.join("prophet_model.pkl")).unwrap(),
            "fresh"
        );
    }

    #[test]
    fn test_package_dry_run_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let manifest = PackageFixture::new("fbprophet").write(tmp.path());
        let ws = Workspace::new(&manifest).unwrap();

        assert!(package(&ws, true).unwrap().is_none());
        assert!(!tmp.path().join("build").exists());
    }

    #[test]
    fn test_package_missing_source_dir() {
        let tmp = TempDir::new().unwrap();
        let manifest = PackageFixture::new("fbprophet").write(tmp.path());
        std::fs::remove_dir_all(tmp.path().join("fbprophet")).unwrap();
        let ws = Workspace::new(&manifest).unwrap();

        let err = package(&ws, false).unwrap_err();
        assert!(err.to_string().contains("package source directory not found"));
    }
}
