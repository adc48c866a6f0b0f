//! Analysis command implementations (analyze, series)

use anyhow::Result;
use chrono::Utc;
use tracing::info;
use vigil_core::{
    AIClient, AnalysisOrchestrator, AnalysisReport, AnalyticsConfig, InsightBackend,
    MetricAnalysis, TimeSeriesPoint,
};

use super::{build_request, load_records, truncate};
use crate::cli::SeriesArgs;

/// Width of the bar column in series output
const BAR_WIDTH: usize = 40;

pub async fn cmd_analyze(
    config: &AnalyticsConfig,
    args: &SeriesArgs,
    horizon: Option<u32>,
    insights: bool,
    context: Option<&str>,
) -> Result<()> {
    let request = build_request(args, config, horizon, Utc::now().date_naive())?;
    let records = load_records(&args.records)?;

    if !insights {
        let analysis = AnalysisOrchestrator::analyze_records(&records, &request);
        if args.json {
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        } else {
            print_analysis(&analysis);
        }
        return Ok(());
    }

    let client = if config.insights.enabled {
        AIClient::from_env_with(config.insights.clone())
    } else {
        info!("Insights disabled in config");
        None
    };
    if let Some(ref client) = client {
        info!(backend = client.backend_name(), host = client.host(), "Requesting insights");
    }

    let report =
        AnalysisOrchestrator::analyze_with_insights(&records, &request, client.as_ref(), context)
            .await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_analysis(&report.analysis);
        print_insights(&report);
    }
    Ok(())
}

pub fn cmd_series(config: &AnalyticsConfig, args: &SeriesArgs) -> Result<()> {
    let request = build_request(args, config, None, Utc::now().date_naive())?;
    let records = load_records(&args.records)?;
    let analysis = AnalysisOrchestrator::analyze_records(&records, &request);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis.series)?);
        return Ok(());
    }

    println!();
    println!("📈 {}", analysis.label);
    println!(
        "   {} to {} ({} days)",
        analysis.range.start(),
        analysis.range.end(),
        analysis.range.days()
    );
    println!("   ─────────────────────────────────────────────────────────────");
    for line in series_lines(&analysis.series) {
        println!("   {}", line);
    }
    println!();
    Ok(())
}

/// One `date │ value │ bar` line per point, bars scaled to the series max
pub fn series_lines(series: &[TimeSeriesPoint]) -> Vec<String> {
    let max = series.iter().map(|p| p.value).fold(0.0_f64, f64::max);
    series
        .iter()
        .map(|p| {
            let width = if max > 0.0 {
                ((p.value.max(0.0) / max) * BAR_WIDTH as f64).round() as usize
            } else {
                0
            };
            format!("{} │ {:>10.2} │ {}", p.date, p.value, "█".repeat(width))
        })
        .collect()
}

fn print_analysis(analysis: &MetricAnalysis) {
    let result = &analysis.result;
    let trend = &result.trend;

    println!();
    println!("📊 {}", truncate(&analysis.label, 60));
    println!(
        "   {} to {} ({} days)",
        analysis.range.start(),
        analysis.range.end(),
        analysis.range.days()
    );
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Trend:        {} ({:+.4} per day)", trend.trend_kind, trend.slope);
    println!("   Fit (R²):     {:.3}", trend.r_squared);
    println!("   Confidence:   {:.0}%", result.overall_confidence * 100.0);
    println!(
        "   Seasonality:  {}",
        if result.seasonality_detected {
            "weekly pattern detected"
        } else {
            "none detected"
        }
    );

    println!();
    if result.anomalies.is_empty() {
        println!("   No anomalies.");
    } else {
        println!("   ⚠️  {} anomalies:", result.anomalies.len());
        println!(
            "   {:10} │ {:>10} │ {:>10} │ {:8}",
            "Date", "Observed", "Expected", "Severity"
        );
        println!("   ───────────┼────────────┼────────────┼─────────");
        for anomaly in &result.anomalies {
            println!(
                "   {:10} │ {:>10.2} │ {:>10.2} │ {}",
                anomaly.date, anomaly.observed_value, anomaly.expected_value, anomaly.severity
            );
        }
    }

    println!();
    match (result.forecast.first(), result.forecast.last()) {
        (Some(first), Some(last)) => {
            println!(
                "   Forecast ({} days, confidence {:.0}%):",
                result.forecast.len(),
                first.confidence * 100.0
            );
            for point in [first, last] {
                println!(
                    "   {:10} │ {:>10.2}  [{:.2}, {:.2}]",
                    point.date, point.predicted_value, point.lower_bound, point.upper_bound
                );
            }
        }
        _ => println!("   No forecast (empty series)."),
    }
}

fn print_insights(report: &AnalysisReport) {
    println!();
    if report.insights_available {
        println!("💡 Insights");
        for insight in &report.insights {
            println!("   • {}", insight);
        }
    } else {
        println!(
            "💡 Insights unavailable: {}",
            report.insights_error.as_deref().unwrap_or("unknown reason")
        );
        println!("   Tip: Set AI_BACKEND and OLLAMA_HOST (or OPENAI_COMPATIBLE_HOST)");
    }
    println!();
}
