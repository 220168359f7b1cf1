//! Error types for Outlay

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Data source not found: {}", .0.display())]
    DataSourceMissing(PathBuf),

    #[error("No usable transactions in data source")]
    EmptyDataset,

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Not enough data to forecast: {distinct_dates} distinct date(s)")]
    InsufficientForecastData { distinct_dates: usize },

    #[error("Forecast error: {0}")]
    Forecast(String),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, Error>;
