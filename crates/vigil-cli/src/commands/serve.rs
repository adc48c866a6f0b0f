//! Server command implementation

use std::path::Path;

use anyhow::{Context, Result};
use vigil_core::AnalyticsConfig;

use super::load_records;

pub async fn cmd_serve(
    config: AnalyticsConfig,
    host: &str,
    port: u16,
    records_path: Option<&Path>,
    static_dir: Option<&Path>,
) -> Result<()> {
    println!("🚀 Starting Vigil analytics server...");
    println!("   Listening: http://{}:{}", host, port);

    let records = match records_path {
        Some(path) => {
            let records = load_records(path)?;
            println!("   Records: {} ({})", records.len(), path.display());
            records
        }
        None => {
            println!("   Records: none loaded (POST /api/analytics/trend accepts records)");
            Vec::new()
        }
    };
    if let Some(dir) = static_dir {
        println!("   Static files: {}", dir.display());
    }

    // Comma-separated list of extra CORS origins
    let allowed_origins: Vec<String> = std::env::var("VIGIL_CORS_ORIGINS")
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if !allowed_origins.is_empty() {
        println!(
            "   🌐 CORS origins: {} (VIGIL_CORS_ORIGINS)",
            allowed_origins.join(", ")
        );
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let state = vigil_server::AppState::new(records, config)
        .with_config(vigil_server::ServerConfig { allowed_origins });

    let static_dir_str = static_dir
        .map(|p| p.to_str().context("static dir path must be valid UTF-8"))
        .transpose()?;
    vigil_server::serve(state, host, port, static_dir_str).await?;

    Ok(())
}
