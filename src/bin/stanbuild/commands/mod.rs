//! Command implementations

pub mod artifacts;
pub mod backend;
pub mod build;
pub mod clean;
pub mod completions;
pub mod develop;

use std::path::PathBuf;

use anyhow::{Context, Result};

use stanbuild::builder::BackendRegistry;
use stanbuild::core::Workspace;
use stanbuild::util::GlobalContext;

/// Load the workspace around the current directory.
///
/// A relative `build_lib` is taken relative to the current directory.
pub fn load_workspace(ctx: &GlobalContext, build_lib: Option<PathBuf>) -> Result<Workspace> {
    let manifest_path = ctx.find_manifest()?;
    let ws = Workspace::new(&manifest_path)
        .with_context(|| format!("failed to load {}", manifest_path.display()))?;

    Ok(match build_lib {
        Some(dir) => ws.with_build_lib(ctx.cwd().join(dir)),
        None => ws,
    })
}

/// Registry with toolchains from the merged configuration.
pub fn registry_for(ctx: &GlobalContext, ws: &Workspace) -> BackendRegistry {
    let config = ctx.load_config(&ws.config_path());
    BackendRegistry::from_toolchain(&config.toolchain)
}
