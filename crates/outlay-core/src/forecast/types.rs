//! Core types for forecasting

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One predicted day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    /// Point estimate
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

/// Predictions covering the historical fit and the horizon, ascending by date
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForecastResult {
    pub points: Vec<ForecastPoint>,
}

impl ForecastResult {
    pub fn new(points: Vec<ForecastPoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&ForecastPoint> {
        self.points.iter().find(|p| p.date == date)
    }

    /// Points strictly after `date`
    pub fn after(&self, date: NaiveDate) -> impl Iterator<Item = &ForecastPoint> {
        self.points.iter().filter(move |p| p.date > date)
    }
}

/// A forecast reduced to its forward-looking aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub result: ForecastResult,
    pub last_historical_date: NaiveDate,
    pub horizon_days: u32,
    /// Sum of `yhat` strictly after the last historical date
    pub horizon_sum: f64,
    /// Sum of `yhat_lower` over the same rows
    pub horizon_lower: f64,
    /// Sum of `yhat_upper` over the same rows
    pub horizon_upper: f64,
}

impl ForecastSummary {
    /// Summarize a result relative to the last observed date
    ///
    /// Historical fit rows (on or before `last_historical_date`) are excluded
    /// so realized spend is not counted twice.
    pub fn from_result(
        result: ForecastResult,
        last_historical_date: NaiveDate,
        horizon_days: u32,
    ) -> Self {
        let (mut sum, mut lower, mut upper) = (0.0, 0.0, 0.0);
        for p in result.after(last_historical_date) {
            sum += p.yhat;
            lower += p.yhat_lower;
            upper += p.yhat_upper;
        }

        Self {
            result,
            last_historical_date,
            horizon_days,
            horizon_sum: sum,
            horizon_lower: lower,
            horizon_upper: upper,
        }
    }
}

/// Whether a run produced a forecast
///
/// `InsufficientData` is a normal outcome, distinct from a forecast of zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ForecastOutcome {
    Available(ForecastSummary),
    InsufficientData { distinct_dates: usize },
}

impl ForecastOutcome {
    pub fn summary(&self) -> Option<&ForecastSummary> {
        match self {
            ForecastOutcome::Available(summary) => Some(summary),
            ForecastOutcome::InsufficientData { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, ForecastOutcome::Available(_))
    }

    pub fn horizon_sum(&self) -> Option<f64> {
        self.summary().map(|s| s.horizon_sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn test_horizon_sum_excludes_history() {
        // History ends 2024-01-10; forecast covers 2024-01-01..2024-02-09
        let start = date(1, 1);
        let points: Vec<ForecastPoint> = (0..40)
            .map(|i| {
                let yhat = (i + 1) as f64;
                ForecastPoint {
                    date: start + chrono::Duration::days(i),
                    yhat,
                    yhat_lower: yhat - 1.0,
                    yhat_upper: yhat + 1.0,
                }
            })
            .collect();
        assert_eq!(points.last().unwrap().date, date(2, 9));

        let summary = ForecastSummary::from_result(ForecastResult::new(points), date(1, 10), 30);

        // Rows 11..=40 -> yhat 11..=40
        let expected: f64 = (11..=40).map(|v| v as f64).sum();
        assert_eq!(summary.horizon_sum, expected);
        assert_eq!(summary.horizon_lower, expected - 30.0);
        assert_eq!(summary.horizon_upper, expected + 30.0);
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = ForecastOutcome::InsufficientData { distinct_dates: 1 };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "insufficient_data");
        assert_eq!(json["distinct_dates"], 1);
        assert_eq!(outcome.horizon_sum(), None);

        let available = ForecastOutcome::Available(ForecastSummary::from_result(
            ForecastResult::default(),
            date(1, 1),
            30,
        ));
        let json = serde_json::to_value(&available).unwrap();
        assert_eq!(json["status"], "available");
        assert_eq!(json["horizon_sum"], 0.0);
        assert_eq!(available.horizon_sum(), Some(0.0));
    }
}
