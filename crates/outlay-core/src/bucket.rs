//! Category bucketing for the spending breakdown
//!
//! Categories are ranked by total spend, the top K are kept and the rest are
//! folded into one synthetic bucket. Ranking uses raw per-category totals;
//! [`bucket_matrix`] applies the same assignment to the daily pivot.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{CategoryMatrix, CategoryTotal};

/// What happens to a category in the breakdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketKind {
    /// Shown under its own label
    Kept,
    /// Folded into the "Others" bucket
    Merged,
}

/// One slice of the breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category: String,
    pub total: f64,
    /// Share of the grand total, 0-100
    pub percentage: f64,
}

/// The synthetic bucket for everything outside the top K
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OthersBucket {
    pub label: String,
    pub total: f64,
    pub percentage: f64,
    /// Merged categories, in rank order
    pub members: Vec<String>,
}

/// Result of bucketing one run's categories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketAssignment {
    pub top_k: usize,
    /// Every category, descending by total; ties keep first-seen order
    pub ranked: Vec<CategoryTotal>,
    pub kept: Vec<CategoryShare>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub others: Option<OthersBucket>,
    pub assignments: BTreeMap<String, BucketKind>,
}

impl BucketAssignment {
    pub fn kind(&self, category: &str) -> Option<BucketKind> {
        self.assignments.get(category).copied()
    }

    /// Label a category is shown under in the breakdown
    pub fn label_for<'a>(&'a self, category: &'a str) -> &'a str {
        match (self.kind(category), &self.others) {
            (Some(BucketKind::Merged), Some(others)) => &others.label,
            _ => category,
        }
    }

    /// Kept slices followed by the Others slice, if any
    pub fn slices(&self) -> Vec<CategoryShare> {
        let mut slices = self.kept.clone();
        if let Some(others) = &self.others {
            slices.push(CategoryShare {
                category: others.label.clone(),
                total: others.total,
                percentage: others.percentage,
            });
        }
        slices
    }

    /// Number of categories the breakdown shows (at most K + 1)
    pub fn output_categories(&self) -> usize {
        self.kept.len() + usize::from(self.others.is_some())
    }

    /// Highest-ranked category, if any
    pub fn top(&self) -> Option<&CategoryTotal> {
        self.ranked.first()
    }
}

/// Rank category totals descending
///
/// `sort_by` is stable, so equal totals keep the order of `totals`. The
/// pipeline passes them in first-seen order of the date-sorted ledger, so a
/// tie goes to the category with the earliest transaction date; source row
/// order only decides between rows on the same date.
pub fn rank_categories(totals: &[CategoryTotal]) -> Vec<CategoryTotal> {
    let mut ranked = totals.to_vec();
    ranked.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(Ordering::Equal));
    ranked
}

/// Assign each category to its bucket
///
/// No Others bucket is created when there are at most `top_k` categories.
pub fn assign_buckets(
    totals: &[CategoryTotal],
    top_k: usize,
    others_label: &str,
) -> BucketAssignment {
    let ranked = rank_categories(totals);
    let grand_total: f64 = ranked.iter().map(|c| c.total).sum();
    let share = |amount: f64| {
        if grand_total != 0.0 {
            amount / grand_total * 100.0
        } else {
            0.0
        }
    };

    let split = top_k.min(ranked.len());
    let (head, tail) = ranked.split_at(split);

    let mut assignments = BTreeMap::new();
    let kept: Vec<CategoryShare> = head
        .iter()
        .map(|c| {
            assignments.insert(c.category.clone(), BucketKind::Kept);
            CategoryShare {
                category: c.category.clone(),
                total: c.total,
                percentage: share(c.total),
            }
        })
        .collect();

    let others = if tail.is_empty() {
        None
    } else {
        let total: f64 = tail.iter().map(|c| c.total).sum();
        let members: Vec<String> = tail
            .iter()
            .map(|c| {
                assignments.insert(c.category.clone(), BucketKind::Merged);
                c.category.clone()
            })
            .collect();
        Some(OthersBucket {
            label: others_label.to_string(),
            total,
            percentage: share(total),
            members,
        })
    };

    debug!(
        "Bucketed {} categories: {} kept, {} merged",
        ranked.len(),
        kept.len(),
        others.as_ref().map(|o| o.members.len()).unwrap_or(0)
    );

    BucketAssignment {
        top_k,
        ranked,
        kept,
        others,
        assignments,
    }
}

/// Re-key a matrix through a bucket assignment
///
/// Merged categories collapse into the Others column. Column order is the
/// kept categories in rank order, then Others.
pub fn bucket_matrix(matrix: &CategoryMatrix, assignment: &BucketAssignment) -> CategoryMatrix {
    let mut bucketed = CategoryMatrix {
        categories: assignment.slices().into_iter().map(|s| s.category).collect(),
        rows: BTreeMap::new(),
    };

    for (date, row) in &matrix.rows {
        let out = bucketed.rows.entry(*date).or_default();
        for (category, amount) in row {
            *out.entry(assignment.label_for(category).to_string())
                .or_insert(0.0) += amount;
        }
    }

    bucketed
}
