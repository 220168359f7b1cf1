//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `analyze` - Run the pipeline over a ledger and render or export the report
//! - `config` - Show the effective pipeline configuration

pub mod analyze;
pub mod config;

// Re-export command functions for main.rs
pub use analyze::*;
pub use config::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
