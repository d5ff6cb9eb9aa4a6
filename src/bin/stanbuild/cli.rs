//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use stanbuild::util::shell::ColorChoice;

/// stanbuild - compile Stan models before packaging, developing or testing
#[derive(Parser)]
#[command(name = "stanbuild")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print only errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Report what would be done without compiling or writing anything
    #[arg(short = 'n', long, global = true)]
    pub dry_run: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, value_name = "WHEN", env = "STANBUILD_COLOR", default_value = "auto")]
    pub color: ColorChoice,

    /// Output format for build events
    #[arg(long, global = true, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    Human,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile models into staging, then package
    Build(BuildArgs),

    /// Compile models in place, then link the source tree for development
    Develop(DevelopArgs),

    /// Build into staging and run the test suite against that build
    Test(TestArgs),

    /// List and check model backends
    Backend(BackendArgs),

    /// List compiled model artifacts in a target directory
    Artifacts(ArtifactsArgs),

    /// Remove staging and compiled in-place models
    Clean(CleanArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct BuildArgs {
    /// Staging directory (defaults to build/lib)
    #[arg(long, value_name = "DIR")]
    pub build_lib: Option<PathBuf>,
}

#[derive(Args)]
pub struct DevelopArgs {
    /// Directory receiving the development link (defaults to .stanbuild/develop)
    #[arg(long, value_name = "DIR")]
    pub install_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct TestArgs {
    /// Run 'test_suite' in specified module
    #[arg(short = 'm', long)]
    pub test_module: Option<String>,

    /// Run single test, case or suite (e.g. 'module.test_suite')
    #[arg(short = 's', long, conflicts_with = "test_module")]
    pub test_suite: Option<String>,

    /// Test runner to use
    #[arg(short = 'r', long)]
    pub test_runner: Option<String>,

    /// Test slow suites (default off)
    #[arg(short = 'w', long)]
    pub test_slow: bool,

    /// Staging directory (defaults to build/lib)
    #[arg(long, value_name = "DIR")]
    pub build_lib: Option<PathBuf>,
}

#[derive(Args)]
pub struct BackendArgs {
    #[command(subcommand)]
    pub command: BackendCommands,
}

#[derive(Subcommand)]
pub enum BackendCommands {
    /// List all backends and their toolchain status
    List,

    /// Check that a backend's toolchain is available
    Check(BackendCheckArgs),
}

#[derive(Args)]
pub struct BackendCheckArgs {
    /// Backend name (PYSTAN, CMDSTANPY)
    pub backend: String,
}

#[derive(Args)]
pub struct ArtifactsArgs {
    /// Target directory (defaults to the staging model directory)
    pub dir: Option<PathBuf>,

    /// Look at the in-place model directory instead of staging
    #[arg(long, conflicts_with = "dir")]
    pub in_place: bool,
}

#[derive(Args)]
pub struct CleanArgs {
    /// Only remove the staging directory
    #[arg(long)]
    pub staging_only: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
