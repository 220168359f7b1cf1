//! Data models for Outlay

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Category used when a record has no usable label
pub const DEFAULT_CATEGORY: &str = "Other";

/// A raw ledger row before validation
///
/// Every field is optional text; the loader decides what is usable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub date: Option<String>,
    pub amount: Option<String>,
    pub category: Option<String>,
}

impl RawRecord {
    pub fn new(date: &str, amount: &str, category: Option<&str>) -> Self {
        Self {
            date: Some(date.to_string()),
            amount: Some(amount.to_string()),
            category: category.map(|c| c.to_string()),
        }
    }
}

/// A validated transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    /// Signed amount as recorded in the ledger
    pub amount: f64,
    /// Trimmed label, never empty
    pub category: String,
}

impl Transaction {
    pub fn new(date: NaiveDate, amount: f64, category: impl Into<String>) -> Self {
        Self {
            date,
            amount,
            category: category.into(),
        }
    }
}

/// Result of loading a ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadedTransactions {
    /// Sorted ascending by date; equal dates keep source order
    pub transactions: Vec<Transaction>,
    pub rows_read: usize,
    pub rows_dropped: usize,
}

/// Total spend for one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total: f64,
}

/// Per-day totals, ascending by date, one entry per day that had activity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DailySeries {
    pub points: Vec<DailyTotal>,
}

impl DailySeries {
    pub fn new(points: Vec<DailyTotal>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DailyTotal> {
        self.points.iter()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Number of distinct dates (points are unique per date once aggregated)
    pub fn distinct_dates(&self) -> usize {
        let mut count = 0;
        let mut prev: Option<NaiveDate> = None;
        for p in &self.points {
            if prev != Some(p.date) {
                count += 1;
                prev = Some(p.date);
            }
        }
        count
    }

    pub fn total_for(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by(|p| p.date.cmp(&date))
            .ok()
            .map(|i| self.points[i].total)
    }

    pub fn sum(&self) -> f64 {
        self.points.iter().map(|p| p.total).sum()
    }

    pub fn totals(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.total).collect()
    }
}

/// Total spend for one category over the whole run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

/// Date x category spend matrix
///
/// Missing cells are zero. `categories` lists labels in the order they were
/// first seen in the date-sorted ledger and is the column order for any
/// tabular rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryMatrix {
    pub categories: Vec<String>,
    pub rows: BTreeMap<NaiveDate, BTreeMap<String, f64>>,
}

impl CategoryMatrix {
    /// Add an amount to a cell, registering the category on first sight
    pub fn add(&mut self, date: NaiveDate, category: &str, amount: f64) {
        if !self.categories.iter().any(|c| c == category) {
            self.categories.push(category.to_string());
        }
        *self
            .rows
            .entry(date)
            .or_default()
            .entry(category.to_string())
            .or_insert(0.0) += amount;
    }

    pub fn amount(&self, date: NaiveDate, category: &str) -> f64 {
        self.rows
            .get(&date)
            .and_then(|row| row.get(category))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn row_total(&self, date: NaiveDate) -> f64 {
        self.rows
            .get(&date)
            .map(|row| row.values().sum())
            .unwrap_or(0.0)
    }

    pub fn dates(&self) -> impl Iterator<Item = &NaiveDate> {
        self.rows.keys()
    }

    /// Sum each column across all days, in first-seen category order
    pub fn category_totals(&self) -> Vec<CategoryTotal> {
        self.categories
            .iter()
            .map(|category| CategoryTotal {
                category: category.clone(),
                total: self
                    .rows
                    .values()
                    .filter_map(|row| row.get(category))
                    .sum(),
            })
            .collect()
    }
}
