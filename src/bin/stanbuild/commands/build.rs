//! `stanbuild build` command

use std::sync::Arc;

use anyhow::Result;

use crate::cli::BuildArgs;
use crate::commands::{load_workspace, registry_for};
use stanbuild::ops::{build_hook, HookOutcome};
use stanbuild::util::shell::Status;
use stanbuild::util::{GlobalContext, Shell};

pub fn execute(ctx: &GlobalContext, args: BuildArgs) -> Result<()> {
    let ws = load_workspace(ctx, args.build_lib)?;
    let registry = registry_for(ctx, &ws);
    let shell = ctx.shell();

    shell.status(
        Status::Packaging,
        format!("{} ({})", ws.identity(), ws.root().display()),
    );

    let outcome = build_hook(&ws, &registry)
        .with_dry_run(ctx.is_dry_run())
        .with_shell(Arc::clone(shell))
        .run()?;

    report(shell, &outcome, &ws.build_lib().display().to_string());
    Ok(())
}

/// Print the closing status line of a lifecycle command.
pub fn report(shell: &Shell, outcome: &HookOutcome, destination: &str) {
    match &outcome.report {
        Some(report) => shell.status(
            Status::Finished,
            format!(
                "{} model artifact(s) in {}, package in {}",
                report.artifacts().count(),
                outcome.target_dir.display(),
                destination
            ),
        ),
        None => shell.status(Status::Finished, "dry run, nothing written"),
    }
}
