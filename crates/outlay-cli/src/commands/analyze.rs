//! Analyze command implementation

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use outlay_core::export::export_report;
use outlay_core::{AnalysisReport, ExportFormat, ForecastOutcome, Pipeline, PipelineConfig};
use tracing::{debug, warn};

use super::{missing_config_path, truncate};

/// How `analyze` renders its report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Export(ExportFormat),
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("text") {
            return Ok(Self::Text);
        }
        s.parse::<ExportFormat>()
            .map(Self::Export)
            .map_err(|_| format!("Unknown format: {} (valid: text, json, csv)", s))
    }
}

/// Load config and apply command-line overrides
pub fn resolve_config(
    config_path: Option<&Path>,
    horizon: Option<u32>,
    top_k: Option<usize>,
) -> Result<PipelineConfig> {
    if let Some(path) = missing_config_path(config_path) {
        warn!("Config file {} not found, using defaults", path.display());
    }
    let mut config = PipelineConfig::load(config_path).context("Failed to load pipeline config")?;

    if let Some(days) = horizon {
        config.forecast.horizon_days = days;
    }
    if let Some(k) = top_k {
        config.buckets.top_k = k;
    }

    config.validate().context("Invalid pipeline config")?;
    Ok(config)
}

pub fn cmd_analyze(
    config_path: Option<&Path>,
    file: &Path,
    format: &str,
    out: Option<&Path>,
    horizon: Option<u32>,
    top_k: Option<usize>,
) -> Result<()> {
    let format: OutputFormat = format.parse().map_err(anyhow::Error::msg)?;
    let config = resolve_config(config_path, horizon, top_k)?;

    let report = Pipeline::with_trend(config)
        .run_file(file)
        .with_context(|| format!("Failed to analyze {}", file.display()))?;
    debug!("Dataset fingerprint {}", report.fingerprint);

    match out {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            write_report(&report, format, &mut writer)?;
            writer.flush()?;
            println!("✅ Report written to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            write_report(&report, format, stdout.lock())?;
        }
    }

    Ok(())
}

/// Render a report in the requested format
pub fn write_report<W: Write>(report: &AnalysisReport, format: OutputFormat, writer: W) -> Result<()> {
    match format {
        OutputFormat::Text => write_text(report, writer),
        OutputFormat::Export(export) => {
            export_report(report, export, writer).context("Failed to export report")
        }
    }
}

/// Human-readable summary
pub fn write_text<W: Write>(report: &AnalysisReport, mut w: W) -> Result<()> {
    let kpis = &report.kpis;

    writeln!(w)?;
    writeln!(w, "📊 Spending Summary")?;
    if let (Some(first), Some(last)) = (kpis.first_date, kpis.last_date) {
        writeln!(w, "   Period: {} to {} ({} days with spending)", first, last, kpis.day_count)?;
    }
    writeln!(w, "   ─────────────────────────────────────────────────────────────")?;
    writeln!(w, "   Total:         {:>12.2}", kpis.total_spend)?;
    writeln!(w, "   Average / day: {:>12.2}", kpis.average_per_day)?;
    writeln!(w, "   Transactions:  {:>12}", kpis.transaction_count)?;
    if report.rows_dropped > 0 {
        writeln!(
            w,
            "   ⚠️  Skipped {} of {} rows (bad date or amount)",
            report.rows_dropped, report.rows_read
        )?;
    }
    if let Some(top) = &kpis.top_category {
        writeln!(w, "   Top category:  {} ({:.2})", top.category, top.amount)?;
    }

    writeln!(w)?;
    writeln!(w, "   {:25} │ {:>12} │ {:>6}", "Category", "Amount", "%")?;
    writeln!(w, "   ──────────────────────────┼──────────────┼────────")?;
    for slice in &report.buckets.kept {
        writeln!(
            w,
            "   {:25} │ {:>12.2} │ {:>5.1}%",
            truncate(&slice.category, 25),
            slice.total,
            slice.percentage
        )?;
    }
    if let Some(others) = &report.buckets.others {
        writeln!(
            w,
            "   {:25} │ {:>12.2} │ {:>5.1}%",
            truncate(&format!("{} ({})", others.label, others.members.len()), 25),
            others.total,
            others.percentage
        )?;
    }

    writeln!(w)?;
    if report.outliers.is_empty() {
        writeln!(w, "   No spending spikes.")?;
    } else {
        let cap = report.outliers.cap.unwrap_or_default();
        writeln!(w, "   🔺 Spending spikes (above {:.2}):", cap)?;
        for day in &report.outliers.days {
            writeln!(w, "      {}  {:>12.2}", day.date, day.total)?;
        }
    }

    writeln!(w)?;
    match &report.forecast {
        ForecastOutcome::Available(summary) => {
            writeln!(
                w,
                "   🔮 Next {} days: {:.2} (range {:.2} to {:.2})",
                summary.horizon_days, summary.horizon_sum, summary.horizon_lower, summary.horizon_upper
            )?;
        }
        ForecastOutcome::InsufficientData { distinct_dates } => {
            writeln!(
                w,
                "   🔮 Forecast unavailable: {} distinct date(s), need at least 2",
                distinct_dates
            )?;
        }
    }

    Ok(())
}
