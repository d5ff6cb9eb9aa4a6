//! `stanbuild artifacts` command
//!
//! Lists the compiled models in a target directory by the artifact naming
//! convention the runtime loader relies on.

use anyhow::Result;

use crate::cli::ArtifactsArgs;
use crate::commands::load_workspace;
use stanbuild::builder::{discover_artifacts, BuildInfo};
use stanbuild::util::fs::relative_path;
use stanbuild::util::GlobalContext;

pub fn execute(ctx: &GlobalContext, args: ArtifactsArgs) -> Result<()> {
    let target_dir = match args.dir {
        Some(dir) => ctx.cwd().join(dir),
        None => {
            let ws = load_workspace(ctx, None)?;
            if args.in_place {
                ws.inplace_model_target()
            } else {
                ws.staging_model_target()
            }
        }
    };

    let artifacts = discover_artifacts(&target_dir)?;
    if artifacts.is_empty() {
        println!("No model artifacts in {}", target_dir.display());
        return Ok(());
    }

    println!("{}:", target_dir.display());
    for (backend, path) in &artifacts {
        println!(
            "  {:<10} {}",
            backend.as_str(),
            relative_path(&target_dir, path).display()
        );
    }

    match BuildInfo::load(&target_dir) {
        Ok(info) => {
            println!();
            println!("Last build: `{}` from source {}", info.model, info.source_sha256);
            let built: Vec<_> = info.backends.iter().map(|b| b.backend.as_str()).collect();
            println!("  backends: {}", built.join(", "));

            for built in &info.backends {
                for artifact in &built.artifacts {
                    if !target_dir.join(artifact).is_file() {
                        ctx.shell().warn(format!(
                            "`{}` artifact {} from the last build is missing",
                            built.backend.as_str(),
                            artifact
                        ));
                    }
                }
            }
        }
        Err(e) => tracing::debug!("no build report: {:#}", e),
    }

    Ok(())
}
