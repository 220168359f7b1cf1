//! Headline figures for a run

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::bucket::rank_categories;
use crate::forecast::ForecastSummary;
use crate::models::{CategoryTotal, DailySeries};

/// Largest category by total spend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopCategory {
    pub category: String,
    pub amount: f64,
}

/// Scalar summary of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub total_spend: f64,
    /// Total divided by the number of days with activity
    pub average_per_day: f64,
    pub top_category: Option<TopCategory>,
    /// None when no forecast was made; distinct from a zero forecast
    pub forecast_horizon_total: Option<f64>,
    pub transaction_count: usize,
    pub day_count: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

/// Reduce the derived series to headline figures
///
/// Ties for the top category go to the first-seen category, matching the
/// bucket ranking.
pub fn compute_kpis(
    series: &DailySeries,
    category_totals: &[CategoryTotal],
    forecast: Option<&ForecastSummary>,
    transaction_count: usize,
) -> KpiSummary {
    let total_spend = series.sum();
    let day_count = series.len();
    let average_per_day = if day_count > 0 {
        total_spend / day_count as f64
    } else {
        0.0
    };

    let top_category = rank_categories(category_totals)
        .into_iter()
        .next()
        .map(|c| TopCategory {
            category: c.category,
            amount: c.total,
        });

    KpiSummary {
        total_spend,
        average_per_day,
        top_category,
        forecast_horizon_total: forecast.map(|f| f.horizon_sum),
        transaction_count,
        day_count,
        first_date: series.first_date(),
        last_date: series.last_date(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::{ForecastPoint, ForecastResult};
    use crate::models::DailyTotal;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn sample_series() -> DailySeries {
        DailySeries::new(vec![
            DailyTotal { date: d(1), total: 150.0 },
            DailyTotal { date: d(2), total: 10.0 },
        ])
    }

    fn sample_totals() -> Vec<CategoryTotal> {
        vec![
            CategoryTotal { category: "Food".into(), total: 150.0 },
            CategoryTotal { category: "Travel".into(), total: 10.0 },
        ]
    }

    #[test]
    fn test_basic_kpis() {
        let kpis = compute_kpis(&sample_series(), &sample_totals(), None, 3);

        assert_eq!(kpis.total_spend, 160.0);
        assert_eq!(kpis.average_per_day, 80.0);
        assert_eq!(
            kpis.top_category,
            Some(TopCategory { category: "Food".into(), amount: 150.0 })
        );
        assert_eq!(kpis.transaction_count, 3);
        assert_eq!(kpis.day_count, 2);
        assert_eq!(kpis.first_date, Some(d(1)));
        assert_eq!(kpis.last_date, Some(d(2)));
    }

    #[test]
    fn test_missing_forecast_is_not_zero() {
        let kpis = compute_kpis(&sample_series(), &sample_totals(), None, 3);
        assert_eq!(kpis.forecast_horizon_total, None);

        let json = serde_json::to_value(&kpis).unwrap();
        assert!(json["forecast_horizon_total"].is_null());
    }

    #[test]
    fn test_zero_forecast_is_kept() {
        let summary = ForecastSummary::from_result(
            ForecastResult::new(vec![ForecastPoint {
                date: d(3),
                yhat: 0.0,
                yhat_lower: -1.0,
                yhat_upper: 1.0,
            }]),
            d(2),
            1,
        );
        let kpis = compute_kpis(&sample_series(), &sample_totals(), Some(&summary), 3);
        assert_eq!(kpis.forecast_horizon_total, Some(0.0));
    }

    #[test]
    fn test_top_category_tie_prefers_first_seen() {
        let totals = vec![
            CategoryTotal { category: "Books".into(), total: 20.0 },
            CategoryTotal { category: "Art".into(), total: 20.0 },
        ];
        let kpis = compute_kpis(&sample_series(), &totals, None, 2);
        assert_eq!(kpis.top_category.unwrap().category, "Books");
    }

    #[test]
    fn test_empty_inputs() {
        let kpis = compute_kpis(&DailySeries::default(), &[], None, 0);
        assert_eq!(kpis.total_spend, 0.0);
        assert_eq!(kpis.average_per_day, 0.0);
        assert!(kpis.top_category.is_none());
        assert!(kpis.first_date.is_none());
    }
}
