//! Forecasting of daily spend
//!
//! The pipeline does not care how predictions are made. Any model that can be
//! fit to a [`DailySeries`] and asked for a horizon plugs in through the
//! [`Forecaster`] trait.
//!
//! # Architecture
//!
//! - `Forecaster` trait: `fit` a model, then `predict` historical + horizon rows
//! - `TrendForecaster`: built-in linear trend + day-of-week least squares model
//! - `MockForecaster`: deterministic constant predictions for tests
//! - `summarize_forecast`: precondition check and horizon aggregation
//!
//! # Usage
//!
//! ```rust,ignore
//! let forecaster = TrendForecaster::from_config(&config.forecast);
//! match summarize_forecast(&forecaster, &series, &config.forecast)? {
//!     ForecastOutcome::Available(summary) => println!("{:.2}", summary.horizon_sum),
//!     ForecastOutcome::InsufficientData { .. } => println!("not enough data"),
//! }
//! ```

mod mock;
mod trend;
pub mod types;

pub use mock::{MockForecaster, MockModel};
pub use trend::{normal_quantile, TrendForecaster, TrendModel};
pub use types::*;

use chrono::{Days, NaiveDate};
use tracing::{debug, info};

use crate::config::ForecastConfig;
use crate::error::{Error, Result};
use crate::models::DailySeries;

/// Trait defining the interface for forecasting backends
///
/// `predict` must return rows for every historical date followed by one row
/// per day of the horizon, ascending by date.
pub trait Forecaster {
    /// Fitted state produced by `fit`
    type Model;

    /// Short identifier for logs
    fn name(&self) -> &'static str;

    /// Fit a model to the daily series
    fn fit(&self, series: &DailySeries) -> Result<Self::Model>;

    /// Predict the fitted history plus `horizon_days` beyond its last date
    fn predict(&self, model: &Self::Model, horizon_days: u32) -> Result<ForecastResult>;
}

/// The `horizon_days` calendar days following `last`
///
/// Fails instead of panicking when the horizon runs past the last
/// representable date.
pub fn horizon_dates(last: NaiveDate, horizon_days: u32) -> Result<Vec<NaiveDate>> {
    (1..=u64::from(horizon_days))
        .map(|h| {
            last.checked_add_days(Days::new(h)).ok_or_else(|| {
                Error::Forecast(format!(
                    "{} days after {} is out of the supported date range",
                    h, last
                ))
            })
        })
        .collect()
}

/// Run a forecaster over the daily series and summarize the horizon
///
/// Too few distinct dates is not an error: the outcome is
/// `InsufficientData` and the forecaster is never called. Failures inside the
/// forecaster propagate.
pub fn summarize_forecast<F: Forecaster>(
    forecaster: &F,
    series: &DailySeries,
    config: &ForecastConfig,
) -> Result<ForecastOutcome> {
    let distinct_dates = series.distinct_dates();
    if distinct_dates < config.min_distinct_dates.max(2) {
        info!(
            "Skipping forecast: {} distinct date(s), need {}",
            distinct_dates, config.min_distinct_dates
        );
        return Ok(ForecastOutcome::InsufficientData { distinct_dates });
    }

    let last_historical_date = series
        .last_date()
        .ok_or(Error::InsufficientForecastData { distinct_dates })?;

    debug!(
        "Fitting {} forecaster on {} days, horizon {}",
        forecaster.name(),
        series.len(),
        config.horizon_days
    );
    let model = forecaster.fit(series)?;
    let result = forecaster.predict(&model, config.horizon_days)?;

    let summary = ForecastSummary::from_result(result, last_historical_date, config.horizon_days);
    debug!(
        "Forecast horizon total {:.2} ({:.2}..{:.2})",
        summary.horizon_sum, summary.horizon_lower, summary.horizon_upper
    );

    Ok(ForecastOutcome::Available(summary))
}
