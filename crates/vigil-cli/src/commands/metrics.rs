//! Metric catalog listing

use anyhow::Result;
use vigil_core::Metric;

pub fn cmd_metrics() -> Result<()> {
    println!("Available Metrics:\n");
    println!(
        "{:<24} {:<28} {:<22} {:<18} {}",
        "NAME", "LABEL", "ENTITY", "FIELD", "AGGREGATION"
    );
    println!("{}", "-".repeat(100));

    for metric in Metric::all() {
        println!(
            "{:<24} {:<28} {:<22} {:<18} {}",
            metric.as_str(),
            metric.label(),
            metric.source_entity().as_str(),
            metric.value_field().unwrap_or("-"),
            metric.aggregation()
        );
    }

    println!();
    println!("Ad hoc metrics use the form aggregation(entity.field), e.g.:");
    println!("  vigil analyze --records risks.csv --metric \"avg(risk.residual_score)\"");
    println!("Aggregations: count, sum, avg, max, min (count takes no field)");

    Ok(())
}
