//! Prompt template commands (list, show, path)

use std::collections::HashMap;

use anyhow::{Context, Result};
use vigil_core::prompts::default_prompts_dir;
use vigil_core::{PromptId, PromptLibrary, PromptSource};

pub fn cmd_prompts_list() -> Result<()> {
    let mut library = PromptLibrary::new();

    println!("Insight Prompts:\n");
    println!("{:<20} {:>7}  SOURCE", "ID", "VERSION");
    println!("{}", "-".repeat(60));

    for info in library.list() {
        let source = match (&info.override_path, info.override_active) {
            (Some(_), true) => "override".to_string(),
            (Some(path), false) => format!("embedded (override rejected: {})", path.display()),
            (None, _) => "embedded".to_string(),
        };
        println!("{:<20} {:>7}  {}", info.id, info.version, source);
    }

    println!();
    match library.override_dir() {
        Some(dir) => println!("Overrides are read from {}/<id>.md", dir.display()),
        None => println!("No data directory available; only embedded prompts are used."),
    }
    println!("An override must keep every placeholder the embedded prompt uses.");

    Ok(())
}

/// Print a prompt followed by its user section rendered with sample figures
pub fn cmd_prompts_show(prompt_id: &str) -> Result<()> {
    let id: PromptId = prompt_id.parse().with_context(|| {
        let known: Vec<&str> = PromptId::all().iter().map(|id| id.as_str()).collect();
        format!("Available prompts: {}", known.join(", "))
    })?;

    let mut library = PromptLibrary::new();
    let prompt = library.get(id)?;

    println!("Prompt:   {}", prompt.id.as_str());
    println!("Version:  {}", prompt.version);
    match prompt.source {
        PromptSource::Embedded => println!("Source:   embedded"),
        PromptSource::Override(ref path) => println!("Source:   {}", path.display()),
    }
    println!(
        "Requires: {}",
        id.required_placeholders()
            .iter()
            .map(|p| format!("{{{{{}}}}}", p))
            .collect::<Vec<_>>()
            .join(" ")
    );

    println!();
    println!("--- Template ---");
    println!("{}", prompt.body);

    println!();
    println!("--- Sample render ---");
    println!("{}", prompt.render_user(&sample_vars()));

    Ok(())
}

fn sample_vars() -> HashMap<&'static str, String> {
    [
        ("metric", "Incidents Reported"),
        ("trend_kind", "increasing"),
        ("slope", "0.2143"),
        ("r_squared", "0.64"),
        ("anomaly_count", "1"),
        ("max_insights", "5"),
        ("context", "Phishing campaign reported in week 2"),
    ]
    .into_iter()
    .map(|(k, v)| (k, v.to_string()))
    .collect()
}

pub fn cmd_prompts_path() -> Result<()> {
    match default_prompts_dir() {
        Some(path) => {
            println!("{}", path.display());
            if !path.exists() {
                eprintln!();
                eprintln!("Note: This directory does not exist yet.");
                eprintln!("Create it and copy a prompt there as <id>.md to override it.");
            }
        }
        None => {
            eprintln!("Could not determine prompts directory.");
            eprintln!("The data directory is not available on this system.");
        }
    }

    Ok(())
}
