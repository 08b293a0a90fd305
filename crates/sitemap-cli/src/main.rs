//! sitemapctl - operator CLI for the date-partitioned sitemap generator
//!
//! This is the main entry point. Each subcommand lives in its own module
//! under `commands/`.

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod output;
mod utils;

use cli::{Cli, Commands};
use utils::context::AppContext;
use utils::logging::initialize_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_logging(&cli)?;

    let config = utils::context::load_config(cli.config.as_deref())?;
    let ctx = AppContext::open(config)?;

    execute_command(cli, ctx).await
}

async fn execute_command(cli: Cli, ctx: AppContext) -> Result<()> {
    match cli.command {
        Commands::Detect { kind, format } => {
            commands::detect(&ctx, kind, format.resolve())?;
        },

        Commands::Schedule {
            kind,
            dates,
            format,
        } => {
            commands::schedule(&ctx, kind, &dates, format.resolve())?;
        },

        Commands::Generate { dates, format } => {
            commands::generate(&ctx, &dates, format.resolve()).await?;
        },

        Commands::Worker { once, max_tasks } => {
            commands::worker(&ctx, once, max_tasks).await?;
        },

        Commands::Status { format } => {
            commands::status(&ctx, format.resolve())?;
        },

        Commands::Cancel { format } => {
            commands::cancel(&ctx, format.resolve())?;
        },

        Commands::Repair { format } => {
            commands::repair(&ctx, format.resolve())?;
        },

        Commands::Index => {
            commands::index(&ctx)?;
        },

        Commands::Show { date } => {
            commands::show(&ctx, &date)?;
        },

        Commands::Archive { name, page } => {
            commands::archive(&ctx, &name, page)?;
        },
    }

    Ok(())
}
