//! `stanbuild develop` command

use std::sync::Arc;

use anyhow::Result;

use crate::cli::DevelopArgs;
use crate::commands::build::report;
use crate::commands::{load_workspace, registry_for};
use stanbuild::ops::develop::link_path;
use stanbuild::ops::develop_hook;
use stanbuild::util::shell::Status;
use stanbuild::util::GlobalContext;

pub fn execute(ctx: &GlobalContext, args: DevelopArgs) -> Result<()> {
    let ws = load_workspace(ctx, None)?;
    let registry = registry_for(ctx, &ws);
    let shell = ctx.shell();
    let install_dir = args.install_dir.map(|dir| ctx.cwd().join(dir));

    shell.status(
        Status::Linking,
        format!("{} ({})", ws.identity(), ws.root().display()),
    );

    let link = link_path(&ws, install_dir.as_deref());
    let outcome = develop_hook(&ws, &registry, install_dir)
        .with_dry_run(ctx.is_dry_run())
        .with_shell(Arc::clone(shell))
        .run()?;

    report(shell, &outcome, &link.display().to_string());
    Ok(())
}
