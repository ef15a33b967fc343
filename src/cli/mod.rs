//! Command-line interface for struktur.
//!
//! Three subcommands, each a thin wrapper around one [`crate::orchestrator`]
//! entry point: [`build::BuildCommand`] runs the full pipeline and writes
//! output, [`validate::ValidateCommand`] runs load/resolve/canonicalize
//! without writing anything, and [`check_constraints::CheckConstraintsCommand`]
//! checks class lineages in isolation, without even loading instances.
//!
//! Grounded on the teacher's `src/cli/mod.rs` (`Cli`/`CliConfig`/`Commands`
//! shape, `--verbose`/`--quiet`/`--no-progress` global flags, `build_config`
//! translating flags into a log-level decision consumed by `main.rs`).

pub mod build;
pub mod check_constraints;
pub mod validate;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Runtime configuration derived from global CLI flags, handed to `main.rs`
/// to decide the `tracing` log level before any command runs.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// `Some("debug")`, `Some("info")`, or `None` (quiet), mirroring the
    /// teacher's verbose/quiet/default tri-state.
    pub log_level: Option<String>,
    /// Whether progress spinners should be suppressed.
    pub no_progress: bool,
}

/// The struktur command-line interface.
#[derive(Parser)]
#[command(
    name = "struktur",
    about = "A data-driven build engine: classes, aspects and instances compiled to a canonical model and rendered to a deterministic output tree",
    version,
    author
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all logging.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable progress spinners, for automation and CI.
    #[arg(long, global = true)]
    no_progress: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Run the full build and write output.
    Build(build::BuildCommand),
    /// Validate every definition without writing a build directory.
    Validate(validate::ValidateCommand),
    /// Check class lineages for schema constraint conflicts.
    CheckConstraints(check_constraints::CheckConstraintsCommand),
}

impl Cli {
    /// Parse arguments, build a [`CliConfig`], and run.
    pub fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config)
    }

    /// Translate `--verbose`/`--quiet` into a `tracing` log level, the way
    /// the teacher's `Cli::build_config` does.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some("info".to_string())
        };

        CliConfig { log_level, no_progress: self.no_progress }
    }

    /// Dispatch to whichever subcommand was requested.
    pub fn execute_with_config(self, config: CliConfig) -> Result<()> {
        match self.command {
            Commands::Build(cmd) => cmd.execute(config.no_progress),
            Commands::Validate(cmd) => cmd.execute(),
            Commands::CheckConstraints(cmd) => cmd.execute(),
        }
    }
}
