//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::Parser;
use tempfile::TempDir;
use vigil_core::{AnalyticsConfig, TimeSeriesPoint};

use crate::cli::{Cli, Commands, SeriesArgs};
use crate::commands::{self, truncate};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Risks and incidents across 2026-05-01..=2026-05-10
fn write_records_csv(dir: &Path) -> PathBuf {
    let mut csv = String::from("id,entity,created_at,risk_score,severity_score\n");
    for day in 1..=10u32 {
        csv.push_str(&format!(
            "R-{day},risk,2026-05-{day:02}T09:00:00Z,{},\n",
            10 + day
        ));
        csv.push_str(&format!(
            "I-{day},incident,2026-05-{day:02} 14:30:00,,{}\n",
            day % 4 + 1
        ));
    }
    let path = dir.join("records.csv");
    std::fs::write(&path, csv).unwrap();
    path
}

fn series_args(records: PathBuf, metric: &str) -> SeriesArgs {
    SeriesArgs {
        records,
        metric: metric.to_string(),
        period: None,
        from: Some("2026-05-01".to_string()),
        to: Some("2026-05-10".to_string()),
        json: false,
    }
}

fn config() -> AnalyticsConfig {
    AnalyticsConfig::default()
}

// ========== Range & Request Tests ==========

#[test]
fn test_resolve_range_explicit_dates() {
    let args = series_args(PathBuf::from("unused.csv"), "risk_count");
    let range = commands::resolve_range(&args, &config(), date(2026, 10, 1)).unwrap();
    assert_eq!(range.start(), date(2026, 5, 1));
    assert_eq!(range.end(), date(2026, 5, 10));
    assert_eq!(range.days(), 10);
}

#[test]
fn test_resolve_range_period_and_default() {
    let today = date(2026, 10, 19);

    let mut args = series_args(PathBuf::from("unused.csv"), "risk_count");
    args.from = None;
    args.to = None;
    args.period = Some("this-month".to_string());
    let range = commands::resolve_range(&args, &config(), today).unwrap();
    assert_eq!(range.start(), date(2026, 10, 1));
    assert_eq!(range.end(), today);

    args.period = None;
    let range = commands::resolve_range(&args, &config(), today).unwrap();
    assert_eq!(range.days(), config().lookback_days as usize);
    assert_eq!(range.end(), today);
}

#[test]
fn test_resolve_range_rejects_bad_input() {
    let today = date(2026, 10, 19);

    let mut args = series_args(PathBuf::from("unused.csv"), "risk_count");
    args.from = Some("2026-05-10".to_string());
    args.to = Some("2026-05-01".to_string());
    assert!(commands::resolve_range(&args, &config(), today).is_err());

    args.from = Some("May 1st".to_string());
    let err = commands::resolve_range(&args, &config(), today).unwrap_err();
    assert!(err.to_string().contains("--from"));

    args.from = None;
    args.to = None;
    args.period = Some("last-decade".to_string());
    assert!(commands::resolve_range(&args, &config(), today).is_err());
}

#[test]
fn test_build_request_horizon() {
    let args = series_args(PathBuf::from("unused.csv"), "incident_count");
    let today = date(2026, 10, 19);

    let request = commands::build_request(&args, &config(), None, today).unwrap();
    assert_eq!(request.horizon, config().forecast_horizon);
    assert_eq!(request.label, "Incidents Reported");

    let request = commands::build_request(&args, &config(), Some(90), today).unwrap();
    assert_eq!(request.horizon.days(), 90);

    assert!(commands::build_request(&args, &config(), Some(6), today).is_err());
    assert!(commands::build_request(&args, &config(), Some(366), today).is_err());
}

#[test]
fn test_build_request_ad_hoc_metric() {
    let today = date(2026, 10, 19);

    let args = series_args(PathBuf::from("unused.csv"), "sum(risk.risk_score)");
    let request = commands::build_request(&args, &config(), None, today).unwrap();
    assert_eq!(request.label, "sum(risk.risk_score)");

    let args = series_args(PathBuf::from("unused.csv"), "avg(risk)");
    assert!(commands::build_request(&args, &config(), None, today).is_err());

    let args = series_args(PathBuf::from("unused.csv"), "vulnerability_count");
    assert!(commands::build_request(&args, &config(), None, today).is_err());
}

// ========== Record & Config Loading Tests ==========

#[test]
fn test_load_records_csv() {
    let dir = TempDir::new().unwrap();
    let path = write_records_csv(dir.path());

    let records = commands::load_records(&path).unwrap();
    assert_eq!(records.len(), 20);
    assert_eq!(records[0].numeric("risk_score"), Some(11.0));
    assert_eq!(records[1].numeric("risk_score"), None);
}

#[test]
fn test_load_records_errors_name_the_file() {
    let dir = TempDir::new().unwrap();

    let missing = dir.path().join("missing.json");
    let err = commands::load_records(&missing).unwrap_err();
    assert!(err.to_string().contains("missing.json"));

    let unsupported = dir.path().join("records.xlsx");
    std::fs::write(&unsupported, "not a spreadsheet").unwrap();
    assert!(commands::load_records(&unsupported).is_err());
}

#[test]
fn test_load_config_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("analytics.toml");
    std::fs::write(
        &path,
        "[defaults]\nforecast_horizon_days = 60\nlookback_days = 14\n",
    )
    .unwrap();

    let config = commands::load_config(Some(&path)).unwrap();
    assert_eq!(config.forecast_horizon.days(), 60);
    assert_eq!(config.lookback_days, 14);
    assert_eq!(config.source.as_deref(), Some(path.as_path()));

    let err = commands::load_config(Some(&dir.path().join("nope.toml"))).unwrap_err();
    assert!(err.to_string().contains("nope.toml"));
}

// ========== Command Tests ==========

#[test]
fn test_cmd_series() {
    let dir = TempDir::new().unwrap();
    let path = write_records_csv(dir.path());

    let args = series_args(path.clone(), "risk_score_average");
    assert!(commands::cmd_series(&config(), &args).is_ok());

    let mut args = series_args(path, "incident_count");
    args.json = true;
    assert!(commands::cmd_series(&config(), &args).is_ok());
}

#[test]
fn test_cmd_series_missing_records() {
    let dir = TempDir::new().unwrap();
    let args = series_args(dir.path().join("absent.csv"), "risk_count");
    assert!(commands::cmd_series(&config(), &args).is_err());
}

#[tokio::test]
async fn test_cmd_analyze() {
    let dir = TempDir::new().unwrap();
    let path = write_records_csv(dir.path());

    let args = series_args(path.clone(), "risk_count");
    let result = commands::cmd_analyze(&config(), &args, Some(7), false, None).await;
    assert!(result.is_ok());

    let mut args = series_args(path, "max(incident.severity_score)");
    args.json = true;
    let result = commands::cmd_analyze(&config(), &args, None, false, None).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cmd_analyze_insights_disabled() {
    let dir = TempDir::new().unwrap();
    let path = write_records_csv(dir.path());

    // Disabled insights still print the numeric analysis
    let mut config = config();
    config.insights.enabled = false;
    let args = series_args(path, "incident_count");
    let result = commands::cmd_analyze(&config, &args, None, true, Some("quarter close")).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cmd_analyze_rejects_bad_horizon() {
    let dir = TempDir::new().unwrap();
    let path = write_records_csv(dir.path());
    let args = series_args(path, "risk_count");
    let result = commands::cmd_analyze(&config(), &args, Some(1000), false, None).await;
    assert!(result.is_err());
}

#[test]
fn test_cmd_metrics() {
    assert!(commands::cmd_metrics().is_ok());
}

#[test]
fn test_cmd_prompts() {
    assert!(commands::cmd_prompts_list().is_ok());
    assert!(commands::cmd_prompts_show("trend_insights").is_ok());
    assert!(commands::cmd_prompts_show("categorize_merchant").is_err());
    assert!(commands::cmd_prompts_path().is_ok());
}

// ========== Output Helpers ==========

#[test]
fn test_series_lines_scale_to_max() {
    let series = vec![
        TimeSeriesPoint::new(date(2026, 5, 1), 10.0),
        TimeSeriesPoint::new(date(2026, 5, 2), 5.0),
        TimeSeriesPoint::new(date(2026, 5, 3), 0.0),
    ];
    let lines = commands::series_lines(&series);

    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("2026-05-01"));
    assert_eq!(lines[0].matches('█').count(), 40);
    assert_eq!(lines[1].matches('█').count(), 20);
    assert_eq!(lines[2].matches('█').count(), 0);
    assert!(lines[1].contains("5.00"));
}

#[test]
fn test_series_lines_all_zero() {
    let series = vec![
        TimeSeriesPoint::new(date(2026, 5, 1), 0.0),
        TimeSeriesPoint::new(date(2026, 5, 2), 0.0),
    ];
    let lines = commands::series_lines(&series);
    assert!(lines.iter().all(|l| !l.contains('█')));
    assert!(commands::series_lines(&[]).is_empty());
}

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("exactly ten", 11), "exactly ten");
    assert_eq!(truncate("this is a long metric label", 10), "this is...");
    assert_eq!(truncate("évaluation des risques", 8), "évalu...");
}

// ========== Argument Parsing ==========

#[test]
fn test_parse_analyze_args() {
    let cli = Cli::try_parse_from([
        "vigil",
        "analyze",
        "--records",
        "risks.csv",
        "--metric",
        "risk_count",
        "--period",
        "last-30-days",
        "--horizon",
        "14",
        "--insights",
        "--context",
        "new framework",
    ])
    .unwrap();

    match cli.command {
        Commands::Analyze {
            series,
            horizon,
            insights,
            context,
        } => {
            assert_eq!(series.records, PathBuf::from("risks.csv"));
            assert_eq!(series.period.as_deref(), Some("last-30-days"));
            assert_eq!(horizon, Some(14));
            assert!(insights);
            assert_eq!(context.as_deref(), Some("new framework"));
        }
        _ => panic!("expected analyze"),
    }
}

#[test]
fn test_parse_rejects_conflicting_range_flags() {
    let period_and_dates = Cli::try_parse_from([
        "vigil", "series", "-r", "x.csv", "-m", "risk_count", "--period", "this-year", "--from",
        "2026-01-01", "--to", "2026-02-01",
    ]);
    assert!(period_and_dates.is_err());

    let lone_from = Cli::try_parse_from([
        "vigil", "series", "-r", "x.csv", "-m", "risk_count", "--from", "2026-01-01",
    ]);
    assert!(lone_from.is_err());

    let context_without_insights = Cli::try_parse_from([
        "vigil", "analyze", "-r", "x.csv", "-m", "risk_count", "--context", "why",
    ]);
    assert!(context_without_insights.is_err());
}

#[test]
fn test_parse_serve_defaults() {
    let cli = Cli::try_parse_from(["vigil", "serve", "--config", "vigil.toml"]).unwrap();
    assert_eq!(cli.config, Some(PathBuf::from("vigil.toml")));

    match cli.command {
        Commands::Serve {
            port,
            host,
            records,
            static_dir,
        } => {
            assert_eq!(port, 3000);
            assert_eq!(host, "127.0.0.1");
            assert!(records.is_none());
            assert!(static_dir.is_none());
        }
        _ => panic!("expected serve"),
    }
}
