//! Default action of `stanbuild develop`: link the source tree.
//!
//! A development link is a one-line file, `<install dir>/<name>.link`,
//! holding the absolute package root. Interpreters that honour it import the
//! package straight from the source tree, where `develop` has just compiled
//! the models in place.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::Workspace;
use crate::util::fs::{normalize_path, write_string};

/// Path of the development link for this workspace.
pub fn link_path(ws: &Workspace, install_dir: Option<&Path>) -> PathBuf {
    let dir = install_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| ws.develop_dir());
    dir.join(format!("{}.link", ws.identity().normalized_name()))
}

/// Write the development link.
///
/// With `dry_run` the link is only reported and `None` is returned.
pub fn develop(ws: &Workspace, install_dir: Option<&Path>, dry_run: bool) -> Result<Option<PathBuf>> {
    let link = link_path(ws, install_dir);
    let root = normalize_path(ws.root());

    if dry_run {
        tracing::info!(
            "would link {} to {} (dry run)",
            link.display(),
            root.display()
        );
        return Ok(None);
    }

    write_string(&link, &format!("{}\n", root.display()))?;
    tracing::info!("linked {} to {}", ws.identity(), root.display());

    Ok(Some(link))
}
