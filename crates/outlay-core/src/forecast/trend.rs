//! Built-in trend + weekday forecaster
//!
//! Fits daily totals with ordinary least squares:
//!
//! ```text
//! y(t) = b0 + b1 * t + Σ_k w_k * [weekday(t) == k]    (k = Tue..Sun)
//! ```
//!
//! `t` is days since the first observed date. The weekday terms are only used
//! once the history spans two weeks and has enough points to pin them down;
//! shorter histories get the trend alone. Days without transactions are not
//! filled in, the regression simply has no row for them.
//!
//! Intervals are ordinary prediction intervals: `yhat ± z * σ * sqrt(1 + h)`,
//! with σ the residual standard error and `h` the leverage of the row, so they
//! widen as the horizon moves away from the data.

use chrono::{Datelike, NaiveDate};
use nalgebra::{DMatrix, DVector};
use tracing::{debug, info};

use crate::config::ForecastConfig;
use crate::error::{Error, Result};
use crate::models::DailySeries;

use super::types::{ForecastPoint, ForecastResult};
use super::{horizon_dates, Forecaster};

/// History needed before weekday terms are fitted
const WEEKLY_MIN_SPAN_DAYS: i64 = 14;
const WEEKLY_MIN_POINTS: usize = 10;

/// Linear trend + day-of-week forecaster
#[derive(Debug, Clone)]
pub struct TrendForecaster {
    /// Coverage of the prediction interval, in (0, 1)
    interval_width: f64,
}

impl TrendForecaster {
    pub fn new(interval_width: f64) -> Self {
        Self { interval_width }
    }

    pub fn from_config(config: &ForecastConfig) -> Self {
        Self::new(config.interval_width)
    }

    pub fn interval_width(&self) -> f64 {
        self.interval_width
    }
}

impl Default for TrendForecaster {
    fn default() -> Self {
        Self::new(ForecastConfig::default().interval_width)
    }
}

/// A fitted trend model
#[derive(Debug, Clone)]
pub struct TrendModel {
    origin: NaiveDate,
    history: Vec<NaiveDate>,
    weekly: bool,
    coefficients: DVector<f64>,
    /// Residual standard error
    sigma: f64,
    /// Transposed pseudo-inverse of the design matrix, for leverage
    pinv_t: DMatrix<f64>,
}

impl TrendModel {
    pub fn uses_weekly_terms(&self) -> bool {
        self.weekly
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Estimated change in daily spend per day
    pub fn slope(&self) -> f64 {
        self.coefficients[1]
    }

    fn design_row(&self, date: NaiveDate) -> DVector<f64> {
        DVector::from_vec(design_row(self.origin, self.weekly, date))
    }
}

/// Regressors for one date
fn design_row(origin: NaiveDate, weekly: bool, date: NaiveDate) -> Vec<f64> {
    let t = (date - origin).num_days() as f64;
    let mut row = vec![1.0, t];
    if weekly {
        let weekday = date.weekday().num_days_from_monday();
        row.extend((1..7).map(|k| if weekday == k { 1.0 } else { 0.0 }));
    }
    row
}

/// Solve a least squares problem using SVD.
///
/// Rank-deficient designs (e.g. a weekday never observed) resolve to the
/// minimum-norm solution. Returns `None` if no finite solution is found.
fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

impl Forecaster for TrendForecaster {
    type Model = TrendModel;

    fn name(&self) -> &'static str {
        "trend"
    }

    fn fit(&self, series: &DailySeries) -> Result<TrendModel> {
        let distinct_dates = series.distinct_dates();
        let (origin, last) = match (series.first_date(), series.last_date()) {
            (Some(first), Some(last)) if distinct_dates >= 2 => (first, last),
            _ => return Err(Error::InsufficientForecastData { distinct_dates }),
        };

        let n = series.len();
        let weekly = (last - origin).num_days() >= WEEKLY_MIN_SPAN_DAYS && n >= WEEKLY_MIN_POINTS;
        if !weekly {
            info!(
                "Weekday terms disabled: {} days over {} calendar days",
                n,
                (last - origin).num_days() + 1
            );
        }

        let rows: Vec<Vec<f64>> = series
            .iter()
            .map(|p| design_row(origin, weekly, p.date))
            .collect();
        let p = rows[0].len();
        let x = DMatrix::from_fn(n, p, |i, j| rows[i][j]);
        let y = DVector::from_iterator(n, series.iter().map(|pt| pt.total));

        let coefficients = solve_least_squares(&x, &y)
            .ok_or_else(|| Error::Forecast("least squares fit did not converge".into()))?;

        let residuals = &y - &x * &coefficients;
        let dof = n.saturating_sub(p).max(1);
        let sigma = (residuals.norm_squared() / dof as f64).sqrt();

        let pinv = x
            .pseudo_inverse(1e-10)
            .map_err(|e| Error::Forecast(format!("pseudo-inverse failed: {}", e)))?;

        debug!(
            "Trend fit: slope {:.4}/day, sigma {:.4}, weekly={}",
            coefficients[1], sigma, weekly
        );

        Ok(TrendModel {
            origin,
            history: series.iter().map(|pt| pt.date).collect(),
            weekly,
            coefficients,
            sigma,
            pinv_t: pinv.transpose(),
        })
    }

    fn predict(&self, model: &TrendModel, horizon_days: u32) -> Result<ForecastResult> {
        let Some(&last) = model.history.last() else {
            return Ok(ForecastResult::default());
        };

        let z = normal_quantile(0.5 + self.interval_width / 2.0);
        let future = horizon_dates(last, horizon_days)?;

        let points = model
            .history
            .iter()
            .copied()
            .chain(future)
            .map(|date| {
                let row = model.design_row(date);
                let yhat = row.dot(&model.coefficients);
                let leverage = (&model.pinv_t * &row).norm_squared();
                let half_width = z * model.sigma * (1.0 + leverage).sqrt();
                ForecastPoint {
                    date,
                    yhat,
                    yhat_lower: yhat - half_width,
                    yhat_upper: yhat + half_width,
                }
            })
            .collect();

        Ok(ForecastResult::new(points))
    }
}

/// Inverse of the standard normal CDF
///
/// Acklam's rational approximation (relative error below 1.2e-9), enough
/// for sizing intervals. `p` outside (0, 1) yields an infinite value.
pub fn normal_quantile(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969_683_028_665_376e1,
        2.209_460_984_245_205e2,
        -2.759_285_104_469_687e2,
        1.383_577_518_672_690e2,
        -3.066_479_806_614_716e1,
        2.506_628_277_459_239,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e1,
        1.615_858_368_580_409e2,
        -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1,
        -1.328_068_155_288_572e1,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-3,
        -3.223_964_580_411_365e-1,
        -2.400_758_277_161_838,
        -2.549_732_539_343_734,
        4.374_664_141_464_968,
        2.938_163_982_698_783,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-3,
        3.224_671_290_700_398e-1,
        2.445_134_137_142_996,
        3.754_408_661_907_416,
    ];
    const P_LOW: f64 = 0.02425;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crate::models::DailyTotal;

    fn series_from(start: NaiveDate, totals: &[f64]) -> DailySeries {
        DailySeries::new(
            totals
                .iter()
                .enumerate()
                .map(|(i, t)| DailyTotal {
                    date: start + Duration::days(i as i64),
                    total: *t,
                })
                .collect(),
        )
    }

    #[test]
    fn test_normal_quantile() {
        assert!(normal_quantile(0.5).abs() < 1e-9);
        assert!((normal_quantile(0.9) - 1.281_551_565_5).abs() < 1e-6);
        assert!((normal_quantile(0.975) - 1.959_963_985).abs() < 1e-6);
        assert!((normal_quantile(0.01) + 2.326_347_874).abs() < 1e-6);
        assert!(normal_quantile(1.0).is_infinite());
    }

    #[test]
    fn test_linear_series_extrapolates() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let totals: Vec<f64> = (0..5).map(|t| 10.0 + 2.0 * t as f64).collect();
        let series = series_from(start, &totals);

        let forecaster = TrendForecaster::default();
        let model = forecaster.fit(&series).unwrap();
        assert!(!model.uses_weekly_terms());
        assert!((model.slope() - 2.0).abs() < 1e-9);

        let result = forecaster.predict(&model, 30).unwrap();
        assert_eq!(result.len(), 35);

        let last = result.points.last().unwrap();
        assert_eq!(last.date, start + Duration::days(34));
        assert!((last.yhat - (10.0 + 2.0 * 34.0)).abs() < 1e-6);
        assert!((last.yhat_upper - last.yhat).abs() < 1e-6);
    }

    #[test]
    fn test_weekly_pattern_is_captured() {
        // 2024-01-01 is a Monday; Saturdays spike to 100
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let totals: Vec<f64> = (0..28)
            .map(|i| if i % 7 == 5 { 100.0 } else { 10.0 })
            .collect();
        let series = series_from(start, &totals);

        let forecaster = TrendForecaster::default();
        let model = forecaster.fit(&series).unwrap();
        assert!(model.uses_weekly_terms());

        let result = forecaster.predict(&model, 14).unwrap();
        let saturday = NaiveDate::from_ymd_opt(2024, 2, 3).unwrap();
        let tuesday = NaiveDate::from_ymd_opt(2024, 2, 6).unwrap();
        assert!((result.get(saturday).unwrap().yhat - 100.0).abs() < 1e-6);
        assert!((result.get(tuesday).unwrap().yhat - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_intervals_contain_estimate_and_widen() {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let totals: Vec<f64> = (0..10)
            .map(|i| if i % 2 == 0 { 55.0 } else { 45.0 })
            .collect();
        let series = series_from(start, &totals);

        let forecaster = TrendForecaster::new(0.8);
        let model = forecaster.fit(&series).unwrap();
        assert!(model.sigma() > 0.0);

        let result = forecaster.predict(&model, 30).unwrap();
        for p in &result.points {
            assert!(p.yhat_lower < p.yhat && p.yhat < p.yhat_upper);
        }

        let width = |p: &ForecastPoint| p.yhat_upper - p.yhat_lower;
        let last_hist = result.get(start + Duration::days(9)).unwrap();
        let far = result.points.last().unwrap();
        assert!(width(far) > width(last_hist));
    }

    #[test]
    fn test_history_rows_follow_observed_dates() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        let series = DailySeries::new(vec![
            DailyTotal { date: d(1), total: 5.0 },
            DailyTotal { date: d(4), total: 8.0 },
            DailyTotal { date: d(9), total: 3.0 },
        ]);

        let forecaster = TrendForecaster::default();
        let model = forecaster.fit(&series).unwrap();
        let result = forecaster.predict(&model, 2).unwrap();

        let dates: Vec<NaiveDate> = result.points.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![d(1), d(4), d(9), d(10), d(11)]);
    }

    #[test]
    fn test_fit_requires_two_dates() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let err = TrendForecaster::default()
            .fit(&series_from(start, &[42.0]))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientForecastData { distinct_dates: 1 }
        ));
    }
}
