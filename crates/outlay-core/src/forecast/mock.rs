//! Mock forecaster for testing
//!
//! Produces flat predictions so tests can assert exact horizon totals
//! without depending on a fitted model.

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::models::DailySeries;

use super::types::{ForecastPoint, ForecastResult};
use super::{horizon_dates, Forecaster};

/// Mock forecaster for testing
///
/// Predicts the same value for every date. With no fixed level it predicts
/// the mean of the fitted history.
#[derive(Debug, Clone, Default)]
pub struct MockForecaster {
    /// Fixed prediction; None means "mean of history"
    pub level: Option<f64>,
    /// Half-width of the interval around each prediction
    pub band: f64,
    /// Whether `fit` should fail
    pub fail: bool,
}

impl MockForecaster {
    /// Predict the historical mean with a zero-width band
    pub fn new() -> Self {
        Self::default()
    }

    /// Predict a fixed value
    pub fn constant(level: f64) -> Self {
        Self {
            level: Some(level),
            ..Self::default()
        }
    }

    /// Fail on every fit
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_band(mut self, band: f64) -> Self {
        self.band = band;
        self
    }
}

/// Fitted state of the mock: the history dates and the level to predict
#[derive(Debug, Clone)]
pub struct MockModel {
    history: Vec<NaiveDate>,
    level: f64,
}

impl Forecaster for MockForecaster {
    type Model = MockModel;

    fn name(&self) -> &'static str {
        "mock"
    }

    fn fit(&self, series: &DailySeries) -> Result<MockModel> {
        if self.fail {
            return Err(Error::Forecast("mock forecaster configured to fail".into()));
        }
        if series.is_empty() {
            return Err(Error::InsufficientForecastData { distinct_dates: 0 });
        }

        let level = self
            .level
            .unwrap_or_else(|| series.sum() / series.len() as f64);

        Ok(MockModel {
            history: series.iter().map(|p| p.date).collect(),
            level,
        })
    }

    fn predict(&self, model: &MockModel, horizon_days: u32) -> Result<ForecastResult> {
        let Some(&last) = model.history.last() else {
            return Ok(ForecastResult::default());
        };

        let future = horizon_dates(last, horizon_days)?;
        let points = model
            .history
            .iter()
            .copied()
            .chain(future)
            .map(|date| ForecastPoint {
                date,
                yhat: model.level,
                yhat_lower: model.level - self.band,
                yhat_upper: model.level + self.band,
            })
            .collect();

        Ok(ForecastResult::new(points))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crate::models::DailyTotal;

    #[test]
    fn test_mock_predicts_history_mean() {
        let d1 = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let series = DailySeries::new(vec![
            DailyTotal { date: d1, total: 10.0 },
            DailyTotal { date: d1 + Duration::days(2), total: 30.0 },
        ]);

        let mock = MockForecaster::new().with_band(1.0);
        let model = mock.fit(&series).unwrap();
        let result = mock.predict(&model, 3).unwrap();

        assert_eq!(result.len(), 5);
        assert_eq!(result.points[0].date, d1);
        assert_eq!(result.points[4].date, d1 + Duration::days(5));
        assert!(result.points.iter().all(|p| p.yhat == 20.0));
        assert_eq!(result.points[0].yhat_lower, 19.0);
    }
}
