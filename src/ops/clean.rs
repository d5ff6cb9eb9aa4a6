//! Implementation of `stanbuild clean`.

use std::path::PathBuf;

use anyhow::Result;

use crate::core::Workspace;
use crate::util::fs::remove_dir_all_if_exists;

/// Options for the clean command.
#[derive(Debug, Clone, Default)]
pub struct CleanOptions {
    /// Report what would be removed without removing it
    pub dry_run: bool,
    /// Keep the in-place model target of the source tree
    pub staging_only: bool,
}

/// Remove the staging directory and compiled in-place models.
///
/// Returns the directories that existed and were (or would be) removed.
pub fn clean(ws: &Workspace, opts: &CleanOptions) -> Result<Vec<PathBuf>> {
    let mut candidates = vec![ws.build_lib().to_path_buf()];
    if !opts.staging_only {
        candidates.push(ws.inplace_model_target());
    }

    let mut removed = Vec::new();
    for dir in candidates.into_iter().filter(|d| d.exists()) {
        if opts.dry_run {
            tracing::info!("would remove {} (dry run)", dir.display());
        } else {
            remove_dir_all_if_exists(&dir)?;
            tracing::debug!("removed {}", dir.display());
        }
        removed.push(dir);
    }

    Ok(removed)
}
