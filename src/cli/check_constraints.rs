//! `struktur check-constraints` - report schema constraint conflicts across
//! every class's lineage without loading any instance data.

use crate::config::BuildConfig;
use crate::orchestrator;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

/// Check every class's `$schemas` lineage for impossible range, enum,
/// type, or length constraints (spec.md §4.8).
#[derive(Debug, Args)]
pub struct CheckConstraintsCommand {
    /// Path to the build configuration file.
    #[arg(short, long, default_value = "struktur.toml", value_name = "FILE")]
    pub config: PathBuf,
}

impl CheckConstraintsCommand {
    pub fn execute(self) -> Result<()> {
        let config = BuildConfig::load(&self.config)?;
        let conflicts = orchestrator::check_constraints(&config)?;

        if conflicts.is_empty() {
            println!("{}", "✓ no constraint conflicts".green());
            return Ok(());
        }

        for conflict in &conflicts {
            println!("{} {conflict}", "conflict:".red());
        }
        anyhow::bail!("{} constraint conflict(s) found", conflicts.len());
    }
}
