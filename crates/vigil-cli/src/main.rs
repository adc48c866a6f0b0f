//! Vigil CLI - GRC trend analytics
//!
//! Usage:
//!   vigil metrics                                    List the metric catalog
//!   vigil series  --records FILE --metric M          Print the daily series
//!   vigil analyze --records FILE --metric M          Trend, anomalies, forecast
//!   vigil serve   --port 3000 --records FILE         Start the API server

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze {
            series,
            horizon,
            insights,
            context,
        } => {
            commands::cmd_analyze(&config, &series, horizon, insights, context.as_deref()).await
        }
        Commands::Series { series } => commands::cmd_series(&config, &series),
        Commands::Metrics => commands::cmd_metrics(),
        Commands::Prompts { action } => match action {
            None | Some(PromptsAction::List) => commands::cmd_prompts_list(),
            Some(PromptsAction::Show { prompt_id }) => commands::cmd_prompts_show(&prompt_id),
            Some(PromptsAction::Path) => commands::cmd_prompts_path(),
        },
        Commands::Serve {
            port,
            host,
            records,
            static_dir,
        } => {
            commands::cmd_serve(
                config,
                &host,
                port,
                records.as_deref(),
                static_dir.as_deref(),
            )
            .await
        }
    }
}
