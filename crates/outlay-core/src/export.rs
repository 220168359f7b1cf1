//! Export of analysis reports
//!
//! Supports:
//! - Full JSON report (every stage output, pretty-printed)
//! - Chart CSV: one row per date with actuals, forecast band and outlier flag

use std::collections::BTreeMap;
use std::io::Write;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::pipeline::AnalysisReport;

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(format!("Unknown export format: {} (valid: json, csv)", s)),
        }
    }
}

/// One line of the chart table
///
/// History-only dates have no forecast columns when no forecast was made;
/// horizon dates have no `actual`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRow {
    pub date: NaiveDate,
    pub actual: Option<f64>,
    pub yhat: Option<f64>,
    pub yhat_lower: Option<f64>,
    pub yhat_upper: Option<f64>,
    pub outlier: bool,
}

impl ChartRow {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            actual: None,
            yhat: None,
            yhat_lower: None,
            yhat_upper: None,
            outlier: false,
        }
    }
}

/// Join the daily series, forecast and outlier flags on date
pub fn chart_rows(report: &AnalysisReport) -> Vec<ChartRow> {
    let mut rows: BTreeMap<NaiveDate, ChartRow> = BTreeMap::new();

    for day in report.daily.iter() {
        let row = rows.entry(day.date).or_insert_with(|| ChartRow::empty(day.date));
        row.actual = Some(day.total);
        row.outlier = report.outliers.contains(day.date);
    }

    if let Some(summary) = report.forecast.summary() {
        for p in &summary.result.points {
            let row = rows.entry(p.date).or_insert_with(|| ChartRow::empty(p.date));
            row.yhat = Some(p.yhat);
            row.yhat_lower = Some(p.yhat_lower);
            row.yhat_upper = Some(p.yhat_upper);
        }
    }

    rows.into_values().collect()
}

/// Write the full report as pretty JSON
pub fn write_json<W: Write>(report: &AnalysisReport, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, report)?;
    writeln!(writer)?;
    Ok(())
}

/// Write the chart table as CSV with a header row
pub fn write_chart_csv<W: Write>(report: &AnalysisReport, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in chart_rows(report) {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a report in the requested format
pub fn export_report<W: Write>(
    report: &AnalysisReport,
    format: ExportFormat,
    writer: W,
) -> Result<()> {
    match format {
        ExportFormat::Json => write_json(report, writer),
        ExportFormat::Csv => write_chart_csv(report, writer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::forecast::MockForecaster;
    use crate::models::RawRecord;
    use crate::pipeline::Pipeline;

    fn report(records: Vec<RawRecord>) -> AnalysisReport {
        let pipeline = Pipeline::new(
            PipelineConfig::default(),
            MockForecaster::constant(4.0).with_band(1.0),
        );
        pipeline.run_records(records).unwrap()
    }

    fn two_day_report() -> AnalysisReport {
        report(vec![
            RawRecord::new("2024-01-01", "100", Some("Food")),
            RawRecord::new("2024-01-02", "10", Some("Travel")),
        ])
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!("xml".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::Csv.as_str(), "csv");
    }

    #[test]
    fn test_chart_rows_cover_history_and_horizon() {
        let rows = chart_rows(&two_day_report());

        assert_eq!(rows.len(), 32);
        assert_eq!(rows[0].actual, Some(100.0));
        assert_eq!(rows[0].yhat, Some(4.0));
        assert_eq!(rows[2].actual, None);
        assert_eq!(rows[2].yhat_upper, Some(5.0));
        assert!(rows.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn test_chart_rows_without_forecast() {
        let rows = chart_rows(&report(vec![RawRecord::new("2024-01-01", "3", None)]));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].actual, Some(3.0));
        assert_eq!(rows[0].yhat, None);
    }

    #[test]
    fn test_write_chart_csv() {
        let mut buf = Vec::new();
        write_chart_csv(&two_day_report(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("date,actual,yhat,yhat_lower,yhat_upper,outlier")
        );
        assert_eq!(lines.next(), Some("2024-01-01,100.0,4.0,3.0,5.0,false"));
        assert_eq!(lines.nth(1), Some("2024-01-03,,4.0,3.0,5.0,false"));
    }

    #[test]
    fn test_write_json_is_parseable() {
        let mut buf = Vec::new();
        export_report(&two_day_report(), ExportFormat::Json, &mut buf).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["kpis"]["total_spend"], 110.0);
        assert_eq!(value["forecast"]["status"], "available");
        assert_eq!(value["daily"][0]["date"], "2024-01-01");
    }
}
