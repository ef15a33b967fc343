//! struktur CLI entry point.
//!
//! This is the main executable for the struktur build engine. It handles
//! command-line argument parsing, logging setup, and error display.
//!
//! The CLI supports three commands:
//! - `build` - run the full pipeline and write output
//! - `validate` - load, resolve, and canonicalize without writing anything
//! - `check-constraints` - check class lineages for schema constraint conflicts

use clap::Parser;
use struktur_cli::cli;
use struktur_cli::core::error::user_friendly_error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let config = cli.build_config();

    // RUST_LOG always wins; otherwise --verbose forces debug, falling back to
    // the CLI's own quiet/info/debug tri-state.
    let rust_log_exists = std::env::var("RUST_LOG").is_ok();
    let is_verbose = config.log_level.as_deref() == Some("debug");

    let filter = if rust_log_exists {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"))
    } else if is_verbose {
        EnvFilter::new("debug")
    } else {
        match config.log_level.as_deref() {
            Some(level) => EnvFilter::new(level),
            None => EnvFilter::new("off"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute_with_config(config) {
        Ok(()) => Ok(()),
        Err(e) => {
            user_friendly_error(e).display();
            std::process::exit(1);
        }
    }
}
