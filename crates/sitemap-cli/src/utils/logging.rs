//! Logging initialization and color control.

use anyhow::Result;
use colored::control as color_control;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::cli::{Cli, Commands};

/// Install the global tracing subscriber based on CLI flags.
///
/// Logs go to stderr. Info logs are suppressed when the command prints JSON,
/// unless `--verbose` was given.
///
/// # Errors
///
/// Returns an error if the global tracing subscriber cannot be set.
pub fn initialize_logging(cli: &Cli) -> Result<()> {
    let mut level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    let machine_output = match &cli.command {
        Commands::Detect { format, .. }
        | Commands::Schedule { format, .. }
        | Commands::Generate { format, .. }
        | Commands::Status { format }
        | Commands::Cancel { format }
        | Commands::Repair { format } => format.resolve().is_machine_readable(),
        Commands::Index | Commands::Show { .. } | Commands::Archive { .. } => true,
        Commands::Worker { .. } => false,
    };
    if machine_output && level == Level::INFO {
        level = Level::WARN;
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let env_no_color = std::env::var_os("NO_COLOR").is_some();
    if cli.no_color || env_no_color || machine_output {
        color_control::set_override(false);
    }
    Ok(())
}
