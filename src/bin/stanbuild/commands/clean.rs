//! `stanbuild clean` command

use anyhow::Result;

use crate::cli::CleanArgs;
use crate::commands::load_workspace;
use stanbuild::ops::{clean, CleanOptions};
use stanbuild::util::shell::Status;
use stanbuild::util::GlobalContext;

pub fn execute(ctx: &GlobalContext, args: CleanArgs) -> Result<()> {
    let ws = load_workspace(ctx, None)?;

    let opts = CleanOptions {
        dry_run: ctx.is_dry_run(),
        staging_only: args.staging_only,
    };
    let removed = clean(&ws, &opts)?;

    let shell = ctx.shell();
    if removed.is_empty() {
        shell.note("nothing to clean");
    }
    for dir in removed {
        let status = if opts.dry_run {
            Status::Skipped
        } else {
            Status::Removed
        };
        shell.status(status, dir.display());
    }

    Ok(())
}
