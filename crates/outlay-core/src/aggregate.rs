//! Daily aggregation
//!
//! Groups transactions by calendar day. Only days with at least one
//! transaction appear; gaps are left for the forecaster to handle.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{CategoryMatrix, CategoryTotal, DailySeries, DailyTotal, Transaction};

/// Output of the aggregation stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub series: DailySeries,
    pub matrix: CategoryMatrix,
}

impl DailyAggregate {
    /// Per-category totals over the whole ledger, in first-seen order
    pub fn category_totals(&self) -> Vec<CategoryTotal> {
        self.matrix.category_totals()
    }
}

/// Aggregate transactions into a daily series and a date x category matrix
///
/// The series is always sorted ascending by date regardless of input order.
/// Category columns are registered in input order, so callers wanting
/// "first seen in the ledger" semantics should pass date-sorted transactions
/// (as the loader produces).
pub fn aggregate_daily(transactions: &[Transaction]) -> DailyAggregate {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    let mut matrix = CategoryMatrix::default();

    for tx in transactions {
        *totals.entry(tx.date).or_insert(0.0) += tx.amount;
        matrix.add(tx.date, &tx.category, tx.amount);
    }

    let series = DailySeries::new(
        totals
            .into_iter()
            .map(|(date, total)| DailyTotal { date, total })
            .collect(),
    );

    debug!(
        "Aggregated {} transactions into {} days x {} categories",
        transactions.len(),
        series.len(),
        matrix.categories.len()
    );

    DailyAggregate { series, matrix }
}
