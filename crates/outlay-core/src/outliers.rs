//! Spike detection over daily totals
//!
//! A day is an outlier when its total strictly exceeds a cap derived from a
//! high quantile of all daily totals:
//!
//! ```text
//! base = quantile(totals, q)
//! cap  = base + |base| * (multiplier - 1)
//! ```
//!
//! For a positive base this is `base * multiplier`. Scaling by the magnitude
//! keeps the cap above the quantile when daily totals are negative (refund
//! heavy ledgers), where a plain product would flag every day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::DailySeries;

/// A flagged day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outlier {
    pub date: NaiveDate,
    pub total: f64,
}

/// Outlier detection result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutlierSet {
    /// None when the series was empty
    pub cap: Option<f64>,
    pub quantile: f64,
    pub multiplier: f64,
    /// Flagged days, ascending by date
    pub days: Vec<Outlier>,
}

impl OutlierSet {
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.days.iter().any(|o| o.date == date)
    }
}

/// Linear-interpolated quantile of unsorted values
///
/// Uses the closest-ranks interpolation `h = (n - 1) * q`, the same
/// definition most dataframe libraries default to. Returns None for empty
/// input.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let q = q.clamp(0.0, 1.0);
    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    let frac = h - lo as f64;

    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Compute the outlier cap for a set of daily totals
pub fn outlier_cap(totals: &[f64], q: f64, multiplier: f64) -> Option<f64> {
    quantile(totals, q).map(|base| base + base.abs() * (multiplier - 1.0))
}

/// Flag days whose total strictly exceeds the cap
///
/// Empty input yields an empty set with no cap; nothing is computed.
pub fn detect_outliers(series: &DailySeries, q: f64, multiplier: f64) -> OutlierSet {
    let Some(cap) = outlier_cap(&series.totals(), q, multiplier) else {
        return OutlierSet {
            cap: None,
            quantile: q,
            multiplier,
            days: Vec::new(),
        };
    };

    let days: Vec<Outlier> = series
        .iter()
        .filter(|p| p.total > cap)
        .map(|p| Outlier {
            date: p.date,
            total: p.total,
        })
        .collect();

    debug!(
        "Outlier cap {:.2} (q={}, x{}): {} of {} days flagged",
        cap,
        q,
        multiplier,
        days.len(),
        series.len()
    );

    OutlierSet {
        cap: Some(cap),
        quantile: q,
        multiplier,
        days,
    }
}
