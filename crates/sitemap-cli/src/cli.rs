//! # CLI Structure and Argument Parsing
//!
//! `sitemapctl` drives the sitemap engine from the command line:
//!
//! ```bash
//! # Which dates have content but no sitemap yet?
//! sitemapctl detect missing
//!
//! # Queue them up and let a worker build them in the background
//! sitemapctl schedule --kind missing
//! sitemapctl worker
//!
//! # Or build a couple of dates right now
//! sitemapctl generate 2024-07-10 2024-07-11
//!
//! # Inspect and control the active run
//! sitemapctl status --format json
//! sitemapctl cancel
//! ```
//!
//! Global options (`--config`, `--verbose`, `--quiet`, `--no-color`) apply to
//! every command.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sitemap_core::DetectionKind;

use crate::output::FormatArg;

/// Main CLI structure for the `sitemapctl` command
#[derive(Parser, Clone, Debug)]
#[command(name = "sitemapctl")]
#[command(version)]
#[command(about = "Incremental, date-partitioned sitemap generation", long_about = None)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the TOML configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'v', long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress informational messages (only show errors)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Available subcommands
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// List dates that need a sitemap partition
    Detect {
        /// Detection strategy: missing, stale, all or modified
        ///
        /// Defaults to `generation.detection` from the configuration.
        kind: Option<DetectionKind>,

        #[command(flatten)]
        format: FormatArg,
    },

    /// Queue background generation for detected or explicit dates
    Schedule {
        /// Detection strategy used when no dates are given
        #[arg(long, conflicts_with = "dates")]
        kind: Option<DetectionKind>,

        /// Dates to build (YYYY-MM-DD)
        #[arg(value_name = "DATE")]
        dates: Vec<String>,

        #[command(flatten)]
        format: FormatArg,
    },

    /// Build dates synchronously
    Generate {
        /// Dates to build (YYYY-MM-DD)
        #[arg(value_name = "DATE", required = true)]
        dates: Vec<String>,

        #[command(flatten)]
        format: FormatArg,
    },

    /// Run queued generation tasks
    Worker {
        /// Run only the tasks that are due now, then exit
        #[arg(long)]
        once: bool,

        /// Stop after handling this many tasks
        #[arg(long, value_name = "N")]
        max_tasks: Option<usize>,
    },

    /// Show progress of the current or last run
    Status {
        #[command(flatten)]
        format: FormatArg,
    },

    /// Stop the active run and drop its pending tasks
    Cancel {
        #[command(flatten)]
        format: FormatArg,
    },

    /// Repair disagreement between run progress and the task queue
    Repair {
        #[command(flatten)]
        format: FormatArg,
    },

    /// Print the sitemap index XML
    Index,

    /// Print the stored sitemap XML for one date
    Show {
        /// Date of the partition (YYYY-MM-DD)
        date: String,
    },

    /// Print one page of an archive sitemap (taxonomy or authors)
    Archive {
        /// Archive name, e.g. `category` or `author`
        name: String,

        /// Page number, starting at 1
        #[arg(default_value_t = 1)]
        page: usize,
    },
}
