//! Outlay Core Library
//!
//! Expense ledger analysis for the Outlay tool:
//! - CSV ledger loading with per-row validation
//! - Daily totals and a date x category spending matrix
//! - Top-K category bucketing with an "Others" remainder
//! - Quantile-cap spike detection
//! - Pluggable forecasting with a built-in trend model
//! - Headline KPIs and JSON/CSV report export

pub mod aggregate;
pub mod bucket;
pub mod config;
pub mod error;
pub mod export;
pub mod forecast;
pub mod import;
pub mod kpi;
pub mod models;
pub mod outliers;
pub mod pipeline;

pub use aggregate::{aggregate_daily, DailyAggregate};
pub use bucket::{
    assign_buckets, bucket_matrix, rank_categories, BucketAssignment, BucketKind, CategoryShare,
    OthersBucket,
};
pub use config::{
    BucketConfig, ForecastConfig, LoaderConfig, OutlierConfig, PipelineConfig,
};
pub use error::{Error, Result};
pub use export::{export_report, ChartRow, ExportFormat};
pub use forecast::{
    summarize_forecast, ForecastOutcome, ForecastPoint, ForecastResult, ForecastSummary,
    Forecaster, MockForecaster, TrendForecaster,
};
pub use import::{load_transactions, normalize_records, parse_csv};
pub use kpi::{compute_kpis, KpiSummary, TopCategory};
pub use models::{
    CategoryMatrix, CategoryTotal, DailySeries, DailyTotal, LoadedTransactions, RawRecord,
    Transaction,
};
pub use outliers::{detect_outliers, Outlier, OutlierSet};
pub use pipeline::{AnalysisReport, Pipeline};
