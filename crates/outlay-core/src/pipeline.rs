//! The analysis pipeline
//!
//! One run: load -> aggregate -> {bucket, outliers} -> forecast -> KPIs.
//!
//! Each stage is a plain function of the previous stage's output; the
//! pipeline only owns the configuration and the forecaster. Front-ends (CLI,
//! renderers) consume the returned [`AnalysisReport`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::aggregate::aggregate_daily;
use crate::bucket::{assign_buckets, bucket_matrix, BucketAssignment};
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::forecast::{summarize_forecast, ForecastOutcome, Forecaster, TrendForecaster};
use crate::import::{dataset_fingerprint, load_transactions, normalize_records};
use crate::kpi::{compute_kpis, KpiSummary};
use crate::models::{CategoryMatrix, DailySeries, LoadedTransactions, RawRecord, Transaction};
use crate::outliers::{detect_outliers, OutlierSet};

/// All computed outputs of a single run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// SHA-256 of the validated ledger
    pub fingerprint: String,
    pub rows_read: usize,
    pub rows_dropped: usize,
    /// Validated ledger, ascending by date
    pub transactions: Vec<Transaction>,
    pub daily: DailySeries,
    pub matrix: CategoryMatrix,
    /// `matrix` with merged categories collapsed into the Others column
    pub bucketed_matrix: CategoryMatrix,
    pub buckets: BucketAssignment,
    pub outliers: OutlierSet,
    pub forecast: ForecastOutcome,
    pub kpis: KpiSummary,
}

/// Configured pipeline, reusable across runs
pub struct Pipeline<F> {
    config: PipelineConfig,
    forecaster: F,
}

impl Pipeline<TrendForecaster> {
    /// Pipeline using the built-in trend forecaster
    pub fn with_trend(config: PipelineConfig) -> Self {
        let forecaster = TrendForecaster::from_config(&config.forecast);
        Self::new(config, forecaster)
    }
}

impl<F: Forecaster> Pipeline<F> {
    pub fn new(config: PipelineConfig, forecaster: F) -> Self {
        Self { config, forecaster }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load a ledger file and analyze it
    pub fn run_file(&self, path: &Path) -> Result<AnalysisReport> {
        let loaded = load_transactions(path, &self.config.loader.default_category)?;
        self.run(loaded)
    }

    /// Validate raw records and analyze them
    pub fn run_records(&self, records: Vec<RawRecord>) -> Result<AnalysisReport> {
        let loaded = normalize_records(records, &self.config.loader.default_category)?;
        self.run(loaded)
    }

    /// Analyze an already loaded ledger
    pub fn run(&self, loaded: LoadedTransactions) -> Result<AnalysisReport> {
        let LoadedTransactions {
            transactions,
            rows_read,
            rows_dropped,
        } = loaded;

        if transactions.is_empty() {
            return Err(Error::EmptyDataset);
        }
        if rows_dropped > 0 {
            warn!(
                "Dropped {} of {} rows with an unusable date or amount",
                rows_dropped, rows_read
            );
        }

        let aggregate = aggregate_daily(&transactions);
        let category_totals = aggregate.category_totals();

        let buckets = assign_buckets(
            &category_totals,
            self.config.buckets.top_k,
            &self.config.buckets.others_label,
        );
        let bucketed_matrix = bucket_matrix(&aggregate.matrix, &buckets);

        let outliers = detect_outliers(
            &aggregate.series,
            self.config.outliers.quantile,
            self.config.outliers.multiplier,
        );

        let forecast = summarize_forecast(&self.forecaster, &aggregate.series, &self.config.forecast)?;

        let kpis = compute_kpis(
            &aggregate.series,
            &category_totals,
            forecast.summary(),
            transactions.len(),
        );

        info!(
            "Analyzed {} transactions over {} days: total {:.2}, {} outlier day(s), forecast {}",
            transactions.len(),
            aggregate.series.len(),
            kpis.total_spend,
            outliers.len(),
            match kpis.forecast_horizon_total {
                Some(total) => format!("{:.2}", total),
                None => "unavailable".to_string(),
            }
        );

        Ok(AnalysisReport {
            fingerprint: dataset_fingerprint(&transactions),
            rows_read,
            rows_dropped,
            transactions,
            daily: aggregate.series,
            matrix: aggregate.matrix,
            bucketed_matrix,
            buckets,
            outliers,
            forecast,
            kpis,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::MockForecaster;

    fn mock_pipeline() -> Pipeline<MockForecaster> {
        Pipeline::new(PipelineConfig::default(), MockForecaster::constant(10.0))
    }

    #[test]
    fn test_run_records_end_to_end() {
        let records = vec![
            RawRecord::new("2024-01-01", "100", Some("Food")),
            RawRecord::new("2024-01-01", "50", Some("Food")),
            RawRecord::new("2024-01-02", "10", Some("Travel")),
            RawRecord::new("2024-01-02", "oops", Some("Travel")),
        ];

        let report = mock_pipeline().run_records(records).unwrap();

        assert_eq!(report.rows_read, 4);
        assert_eq!(report.rows_dropped, 1);
        assert_eq!(report.daily.totals(), vec![150.0, 10.0]);
        assert_eq!(report.kpis.total_spend, 160.0);
        assert_eq!(report.kpis.forecast_horizon_total, Some(300.0));
        assert!(report.buckets.others.is_none());
        assert!(report.outliers.is_empty());
    }

    #[test]
    fn test_single_day_has_no_forecast() {
        let records = vec![
            RawRecord::new("2024-01-01", "5", Some("Food")),
            RawRecord::new("2024-01-01", "7", None),
        ];
        let report = mock_pipeline().run_records(records).unwrap();

        assert_eq!(
            report.forecast,
            ForecastOutcome::InsufficientData { distinct_dates: 1 }
        );
        assert_eq!(report.kpis.forecast_horizon_total, None);
    }

    #[test]
    fn test_ties_go_to_earliest_dated_category() {
        let records = vec![
            RawRecord::new("2024-01-02", "10", Some("Books")),
            RawRecord::new("2024-01-01", "10", Some("Art")),
            RawRecord::new("2024-01-02", "10", Some("Games")),
        ];
        let report = mock_pipeline().run_records(records).unwrap();

        let ranked: Vec<&str> = report
            .buckets
            .ranked
            .iter()
            .map(|c| c.category.as_str())
            .collect();
        assert_eq!(ranked, vec!["Art", "Books", "Games"]);
        assert_eq!(report.kpis.top_category.unwrap().category, "Art");
    }

    #[test]
    fn test_empty_loaded_set_rejected() {
        let loaded = LoadedTransactions {
            transactions: vec![],
            rows_read: 0,
            rows_dropped: 0,
        };
        assert!(matches!(mock_pipeline().run(loaded), Err(Error::EmptyDataset)));
    }

    #[test]
    fn test_forecast_failure_aborts_run() {
        let pipeline = Pipeline::new(PipelineConfig::default(), MockForecaster::failing());
        let records = vec![
            RawRecord::new("2024-01-01", "5", None),
            RawRecord::new("2024-01-02", "5", None),
        ];
        assert!(matches!(
            pipeline.run_records(records),
            Err(Error::Forecast(_))
        ));
    }

    #[test]
    fn test_with_trend_uses_config_interval() {
        let mut config = PipelineConfig::default();
        config.forecast.interval_width = 0.95;
        let pipeline = Pipeline::with_trend(config);
        assert_eq!(pipeline.forecaster.interval_width(), 0.95);
        assert_eq!(pipeline.config().forecast.interval_width, 0.95);
    }
}
