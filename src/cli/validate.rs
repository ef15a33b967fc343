//! `struktur validate` - load, resolve, and canonicalize without writing
//! any build output.

use crate::config::BuildConfig;
use crate::orchestrator;
use crate::validator::Level;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

/// Validate every class, aspect, and instance definition without running
/// the renderer or writing a build directory.
#[derive(Debug, Args)]
pub struct ValidateCommand {
    /// Path to the build configuration file.
    #[arg(short, long, default_value = "struktur.toml", value_name = "FILE")]
    pub config: PathBuf,

    /// Exit with a non-zero status if any warning was found, not just errors.
    #[arg(long)]
    pub strict: bool,
}

impl ValidateCommand {
    pub fn execute(self) -> Result<()> {
        let config = BuildConfig::load(&self.config)?;
        let report = orchestrator::validate(&config)?;

        println!(
            "checked {} instances ({} classes, {} aspects): {} valid, {} invalid",
            report.instance_count, report.class_count, report.aspect_count, report.validation.valid, report.validation.invalid
        );

        let mut warning_count = 0;
        for issue in &report.validation.errors {
            let (marker, color): (&str, fn(&str) -> colored::ColoredString) = match issue.level {
                Level::Error => ("error", |s| s.red()),
                Level::Warning => {
                    warning_count += 1;
                    ("warning", |s| s.yellow())
                }
            };
            println!("{}: {} [{}] {} - {}", color(marker), issue.instance, issue.code, issue.path, issue.message);
        }

        for warning in &report.constraint_warnings {
            warning_count += 1;
            println!("{} {warning}", "warning:".yellow());
        }

        if report.validation.invalid > 0 || (self.strict && warning_count > 0) {
            anyhow::bail!("validation failed");
        }

        println!("{}", "✓ valid".green());
        Ok(())
    }
}
