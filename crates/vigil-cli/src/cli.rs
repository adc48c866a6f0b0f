//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Vigil - Trend, anomaly and forecast analytics for GRC data
#[derive(Parser)]
#[command(name = "vigil")]
#[command(about = "Trend, anomaly and forecast analytics for GRC records", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Analytics config file (defaults to the data dir override, else built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Which records to read and which days to look at
#[derive(Args, Debug, Clone)]
pub struct SeriesArgs {
    /// Records export (.json or .csv with an entity column)
    #[arg(short, long)]
    pub records: PathBuf,

    /// Catalog metric (see `vigil metrics`) or ad hoc, e.g. "avg(risk.risk_score)"
    #[arg(short, long)]
    pub metric: String,

    /// Named period: last-7-days, last-30-days, last-90-days, last-12-months,
    /// this-month, this-year (defaults to the configured lookback)
    #[arg(short, long, conflicts_with_all = ["from", "to"])]
    pub period: Option<String>,

    /// Range start (YYYY-MM-DD)
    #[arg(long, requires = "to")]
    pub from: Option<String>,

    /// Range end (YYYY-MM-DD)
    #[arg(long, requires = "from")]
    pub to: Option<String>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyse a metric: trend, anomalies, seasonality and forecast
    Analyze {
        #[command(flatten)]
        series: SeriesArgs,

        /// Days to forecast (7-365, defaults to the configured horizon)
        #[arg(long)]
        horizon: Option<u32>,

        /// Ask the narrative backend for insights (see AI_BACKEND)
        #[arg(long)]
        insights: bool,

        /// Extra context passed to the narrative backend
        #[arg(long, requires = "insights")]
        context: Option<String>,
    },

    /// Print the aggregated daily series for a metric
    Series {
        #[command(flatten)]
        series: SeriesArgs,
    },

    /// List the metric catalog
    Metrics,

    /// Manage insight prompts (list, show, path)
    Prompts {
        #[command(subcommand)]
        action: Option<PromptsAction>,
    },

    /// Start the analytics API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Records export served by the GET endpoints
        #[arg(short, long)]
        records: Option<PathBuf>,

        /// Directory containing static files to serve (e.g., ui/dist)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// List all prompts and their override status
    List,

    /// Show the content of a prompt
    Show {
        /// Prompt ID (e.g., trend_insights)
        prompt_id: String,
    },

    /// Show the path where prompt overrides should be placed
    Path,
}
