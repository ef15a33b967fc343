//! `struktur build` - run the full build sequence and write output.

use crate::config::BuildConfig;
use crate::orchestrator;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

/// Run the build: load classes, aspects and instances, resolve and
/// validate them, write the canonical model, and render every configured
/// template task.
#[derive(Debug, Args)]
pub struct BuildCommand {
    /// Path to the build configuration file.
    #[arg(short, long, default_value = "struktur.toml", value_name = "FILE")]
    pub config: PathBuf,

    /// Disable the progress spinner.
    #[arg(long)]
    pub no_progress: bool,
}

impl BuildCommand {
    /// Run the build, printing a spinner while it's in flight (unless
    /// suppressed) and a short summary once it finishes.
    pub fn execute(self, no_progress: bool) -> Result<()> {
        let config = BuildConfig::load(&self.config)?;

        let spinner = if self.no_progress || no_progress {
            None
        } else {
            let bar = indicatif::ProgressBar::new_spinner();
            bar.set_message("building...");
            bar.enable_steady_tick(std::time::Duration::from_millis(100));
            Some(bar)
        };

        let result = orchestrator::run(&config);

        if let Some(bar) = &spinner {
            bar.finish_and_clear();
        }

        match result {
            Ok(report) => {
                println!(
                    "{} wrote {} ({} classes, {} aspects, {} instances) to {}",
                    "✓".green(),
                    report.render_summary.files_written.len(),
                    report.class_count,
                    report.aspect_count,
                    report.instance_count,
                    report.build_dir.display()
                );
                for warning in &report.warnings {
                    println!("{} {warning}", "warning:".yellow());
                }
                for warning in &report.constraint_warnings {
                    println!("{} {warning}", "warning:".yellow());
                }
                Ok(())
            }
            Err(e) => Err(anyhow::Error::new(e)),
        }
    }
}
