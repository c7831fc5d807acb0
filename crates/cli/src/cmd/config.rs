//! Configuration command
//!
//! Shows the effective configuration, an example file, or the file path.

use crate::system_config;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::Path;

/// List the effective configuration values
pub async fn run_list(explicit: Option<&Path>) -> Result<()> {
    let config = system_config::load(explicit)?;
    let location = match explicit {
        Some(path) => path.display().to_string(),
        None => match system_config::config_file_path() {
            Some(path) if path.exists() => path.display().to_string(),
            _ => "(defaults)".to_string(),
        },
    };

    println!("{}", "Debounce Configuration".bold());
    println!("{}: {}\n", "Location".dimmed(), location.dimmed());

    println!("{}", "[debounce]".yellow());
    println!(
        "  {} = {} {}",
        "delay_ms".cyan(),
        config.debounce.delay_ms,
        format!("({:?})", config.debounce.delay()).dimmed()
    );

    println!("\n{}", "[output]".yellow());
    println!(
        "  {} = {}",
        "flush_on_eof".cyan(),
        config.output.flush_on_eof
    );
    println!(
        "  {} = {:?}",
        "separator".cyan(),
        config.output.separator
    );

    println!("\n{}", "Valid Ranges:".bold());
    println!("  delay_ms: 0-{}", debounce::config::MAX_DELAY_MS);
    println!("  separator: any non-empty string");

    Ok(())
}

/// Show the config file path and optionally create it
pub async fn run_path(create: bool) -> Result<()> {
    let config_path = system_config::config_file_path()
        .context("Could not determine config file path")?;

    if create && !config_path.exists() {
        system_config::init_if_missing()?;
        println!("{} Created config file at: {}", "✓".green(), config_path.display());
    } else {
        println!("{}", config_path.display());
        if !config_path.exists() {
            println!("{}", "File does not exist. Use --create to create it.".yellow());
        }
    }

    Ok(())
}

/// Show example configuration
pub async fn run_example() -> Result<()> {
    print!("{}", system_config::example_config());
    Ok(())
}
