//! `stanbuild backend` command
//!
//! List and check model backends.

use anyhow::Result;

use crate::cli::{BackendArgs, BackendCommands};
use crate::commands::{load_workspace, registry_for};
use stanbuild::builder::{get_backend_summaries, BackendAvailability, BackendRegistry};
use stanbuild::ops::BACKEND_ENV;
use stanbuild::util::GlobalContext;

pub fn execute(ctx: &GlobalContext, args: BackendArgs) -> Result<()> {
    let registry = registry(ctx);
    match args.command {
        BackendCommands::List => list_backends(&registry),
        BackendCommands::Check(check_args) => check_backend(&registry, &check_args.backend),
    }
}

/// Project toolchains when run inside a package, global ones otherwise.
fn registry(ctx: &GlobalContext) -> BackendRegistry {
    match load_workspace(ctx, None) {
        Ok(ws) => registry_for(ctx, &ws),
        Err(_) => {
            let config = ctx.load_config(&ctx.cwd().join(".stanbuild/config.toml"));
            BackendRegistry::from_toolchain(&config.toolchain)
        }
    }
}

fn list_backends(registry: &BackendRegistry) -> Result<()> {
    let summaries = get_backend_summaries(registry);

    println!("Model Backends:");
    println!();

    for summary in summaries {
        let status = match &summary.availability {
            BackendAvailability::Available { location } => {
                format!("available ({})", location.display())
            }
            BackendAvailability::NotInstalled { .. } => "not installed".to_string(),
        };
        let default = if summary.is_default { " (default)" } else { "" };

        println!("  {}{} - {}", summary.id, default, summary.description);
        println!("    Status:    {}", status);
        println!("    Artifact:  <model>_model.{}", summary.id.artifact_extension());
        println!();
    }

    match std::env::var(BACKEND_ENV) {
        Ok(value) => println!("{}={}", BACKEND_ENV, value),
        Err(_) => println!("{} is not set", BACKEND_ENV),
    }

    Ok(())
}

fn check_backend(registry: &BackendRegistry, name: &str) -> Result<()> {
    let builder = registry.resolve(name)?;
    let id = builder.backend();

    println!("Checking backend: {}", id);
    println!();

    match builder.availability() {
        BackendAvailability::Available { location } => {
            println!("  Status: available");
            println!("  Location: {}", location.display());
            println!();
            println!("Backend '{}' is ready to use.", id);
        }
        BackendAvailability::NotInstalled { tool, install_hint } => {
            println!("  Status: not installed");
            println!("  Tool: {}", tool);
            println!();
            println!("To install: {}", install_hint);
            return Err(anyhow::anyhow!("{} not found", tool));
        }
    }

    Ok(())
}
