//! Output formats shared by all commands.
//!
//! Commands that report results accept `--format text|json` (or the `--json`
//! shorthand). Without a flag, text is used for terminals and JSON for pipes.

mod progress;

pub use progress::spinner;

use anyhow::Result;
use clap::{Args, ValueEnum};
use is_terminal::IsTerminal;
use serde::Serialize;

/// Output format for command results.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text (default for terminals).
    #[default]
    Text,
    /// Pretty-printed JSON (default for pipes).
    Json,
}

impl OutputFormat {
    /// Text for interactive terminals, JSON otherwise.
    #[must_use]
    pub fn detect() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Text
        } else {
            Self::Json
        }
    }

    /// Whether this format is meant for scripts.
    #[must_use]
    pub const fn is_machine_readable(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Format selection flags, flattened into commands that print results.
#[derive(Args, Clone, Debug, Default, PartialEq, Eq)]
pub struct FormatArg {
    /// Output format (text, json)
    ///
    /// Defaults to text for terminals, json for pipes.
    #[arg(short = 'f', long = "format", value_enum, env = "SITEMAP_OUTPUT_FORMAT")]
    pub format: Option<OutputFormat>,

    /// Output as JSON (shorthand for --format json)
    #[arg(long, conflicts_with = "format")]
    pub json: bool,
}

impl FormatArg {
    /// Resolve flags to a concrete format.
    ///
    /// `--json` wins, then `--format`, then terminal detection.
    #[must_use]
    pub fn resolve(&self) -> OutputFormat {
        if self.json {
            return OutputFormat::Json;
        }
        self.format.unwrap_or_else(OutputFormat::detect)
    }
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
