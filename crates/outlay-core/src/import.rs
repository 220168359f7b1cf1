//! Ledger loading: CSV parsing and record validation
//!
//! Loading is best-effort. Rows with an unusable date or amount are dropped
//! and counted, never fatal. Only a missing source, a missing required column
//! or an empty result aborts the run.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{LoadedTransactions, RawRecord, Transaction};

/// Column positions resolved from the header row
#[derive(Debug, Clone, Copy)]
struct Columns {
    date: usize,
    amount: usize,
    category: Option<usize>,
}

impl Columns {
    /// Locate columns by case-insensitive header name
    ///
    /// A `Category` column takes precedence over `Description`; the exported
    /// ledger format only carries `Description`.
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().trim_start_matches('\u{feff}').eq_ignore_ascii_case(name))
        };

        let date = find("date").ok_or_else(|| Error::MissingColumn("Date".into()))?;
        let amount = find("amount").ok_or_else(|| Error::MissingColumn("Amount".into()))?;
        let category = find("category").or_else(|| find("description"));

        Ok(Self {
            date,
            amount,
            category,
        })
    }
}

/// Parse CSV ledger data into raw records
///
/// Rows that fail to decode are skipped; I/O failures abort. A source with
/// no header row at all is an empty dataset, not a missing column.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<RawRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(Error::EmptyDataset);
    }
    let columns = Columns::from_headers(&headers)?;

    let mut records = Vec::new();
    for (index, result) in rdr.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                debug!("Skipping undecodable row {}: {}", index + 1, e);
                records.push(RawRecord::default());
                continue;
            }
        };

        let field = |col: usize| record.get(col).map(|s| s.to_string());
        records.push(RawRecord {
            date: field(columns.date),
            amount: field(columns.amount),
            category: columns.category.and_then(field),
        });
    }

    debug!("Parsed {} ledger rows", records.len());
    Ok(records)
}

/// Load and validate a ledger file
pub fn load_transactions(path: &Path, default_category: &str) -> Result<LoadedTransactions> {
    if !path.exists() {
        return Err(Error::DataSourceMissing(path.to_path_buf()));
    }

    let file = File::open(path)?;
    let records = parse_csv(file)?;
    normalize_records(records, default_category)
}

/// Validate raw records into transactions
///
/// Drops malformed rows, defaults missing categories and sorts by date. The
/// sort is stable so transactions on the same day keep their source order,
/// which is the "first seen" order used for tie-breaking downstream.
pub fn normalize_records(
    records: Vec<RawRecord>,
    default_category: &str,
) -> Result<LoadedTransactions> {
    let rows_read = records.len();
    let mut transactions = Vec::with_capacity(rows_read);

    for (index, record) in records.into_iter().enumerate() {
        match validate_record(&record, default_category) {
            Ok(tx) => transactions.push(tx),
            Err(reason) => debug!("Dropping malformed row {}: {}", index + 1, reason),
        }
    }

    if transactions.is_empty() {
        return Err(Error::EmptyDataset);
    }

    transactions.sort_by_key(|tx| tx.date);

    let rows_dropped = rows_read - transactions.len();
    debug!(
        "Loaded {} transactions ({} dropped)",
        transactions.len(),
        rows_dropped
    );

    Ok(LoadedTransactions {
        transactions,
        rows_read,
        rows_dropped,
    })
}

/// Check a single record; the error string is only used for logging
fn validate_record(record: &RawRecord, default_category: &str) -> std::result::Result<Transaction, String> {
    let date_str = record
        .date
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or("missing date")?;
    let date = parse_date(date_str).ok_or_else(|| format!("unparseable date {:?}", date_str))?;

    let amount_str = record
        .amount
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or("missing amount")?;
    let amount =
        parse_amount(amount_str).ok_or_else(|| format!("non-numeric amount {:?}", amount_str))?;

    Ok(Transaction {
        date,
        amount,
        category: normalize_category(record.category.as_deref(), default_category),
    })
}

/// Trim a label, falling back to the default when absent or blank
pub fn normalize_category(category: Option<&str>, default_category: &str) -> String {
    category
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(default_category)
        .to_string()
}

/// Parse a date string, discarding any time-of-day component
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    let formats = [
        "%Y-%m-%d", // 2024-01-15
        "%m/%d/%Y", // 01/15/2024
        "%m/%d/%y", // 01/15/24
        "%m-%d-%Y", // 01-15-2024
        "%d/%m/%Y", // 15/01/2024 (European)
    ];
    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %I:%M:%S %p",
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// Parse an amount string, handling currency symbols and separators
///
/// Parentheses denote a negative amount. Non-finite values are rejected.
pub fn parse_amount(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .replace(['$', '₹', '€', '£', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Stable SHA-256 fingerprint of a validated ledger
pub fn dataset_fingerprint(transactions: &[Transaction]) -> String {
    let mut hasher = Sha256::new();
    for tx in transactions {
        hasher.update(tx.date.to_string().as_bytes());
        hasher.update(tx.amount.to_be_bytes());
        hasher.update(tx.category.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}
