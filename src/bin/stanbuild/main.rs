//! stanbuild CLI - compile Stan models before packaging, developing or testing

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands, MessageFormat};
use stanbuild::util::{GlobalContext, Shell};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("stanbuild=debug")
    } else if cli.quiet {
        EnvFilter::new("stanbuild=warn")
    } else {
        EnvFilter::new("stanbuild=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let shell = Shell::from_flags(
        cli.quiet,
        cli.verbose,
        cli.color,
        cli.message_format == MessageFormat::Json,
    );
    let ctx = GlobalContext::new()?
        .with_shell(shell)
        .with_dry_run(cli.dry_run);

    // Execute command
    match cli.command {
        Commands::Build(args) => commands::build::execute(&ctx, args),
        Commands::Develop(args) => commands::develop::execute(&ctx, args),
        Commands::Test(args) => commands::test::execute(&ctx, args),
        Commands::Backend(args) => commands::backend::execute(&ctx, args),
        Commands::Artifacts(args) => commands::artifacts::execute(&ctx, args),
        Commands::Clean(args) => commands::clean::execute(&ctx, args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
