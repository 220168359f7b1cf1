//! Config command implementation

use std::path::Path;

use anyhow::{Context, Result};
use outlay_core::config::{default_config_path, resolve_config_path};
use outlay_core::PipelineConfig;

/// An explicit `--config` path that does not exist, if any
///
/// Loading falls back to the override or defaults in that case, so callers
/// should tell the user.
pub fn missing_config_path(explicit: Option<&Path>) -> Option<&Path> {
    explicit.filter(|p| !p.exists())
}

/// Describe where the effective config comes from
pub fn config_source(explicit: Option<&Path>) -> String {
    match resolve_config_path(explicit) {
        Some(path) => path.display().to_string(),
        None => "built-in defaults".to_string(),
    }
}

pub fn cmd_config(explicit: Option<&Path>) -> Result<()> {
    let config = PipelineConfig::load(explicit).context("Failed to load pipeline config")?;

    println!();
    println!("⚙️  Pipeline Configuration");
    println!("   Source: {}", config_source(explicit));
    if let Some(path) = missing_config_path(explicit) {
        println!("   ⚠️  {} not found, ignored", path.display());
    }
    if let Some(path) = default_config_path() {
        println!("   Override path: {}", path.display());
    }
    println!("   ─────────────────────────────────────────────────────────────");
    println!();
    print!("{}", config.to_toml()?);

    Ok(())
}
