//! CSV ingestion for personal transaction exports
//!
//! Expected header (case-sensitive): `Date, Amount, Where?, What?,
//! Category, Source`. Parsing is strict: a malformed row fails the whole
//! ingest with its 1-based row number, and nothing is written — the store
//! either gets the complete new dataset or keeps the old one.

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::io::Read;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::NewTransaction;
use crate::money::parse_amount;
use crate::month::YearMonth;

/// Columns an export file must carry, in any order.
pub const REQUIRED_COLUMNS: [&str; 6] = ["Date", "Amount", "Where?", "What?", "Category", "Source"];

/// SHA-256 fingerprint of the raw file content, hex-encoded.
/// Stored on the ingest record so re-uploads of the same file are visible.
pub fn file_fingerprint(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Convert a CSV record to a JSON object using headers as keys.
fn record_to_json(headers: &StringRecord, record: &StringRecord) -> String {
    let mut map = serde_json::Map::new();
    for (i, header) in headers.iter().enumerate() {
        if let Some(value) = record.get(i) {
            map.insert(header.to_string(), Value::String(value.to_string()));
        }
    }
    json!(map).to_string()
}

/// Parse a transaction export into rows ready for replace-ingestion.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<NewTransaction>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let column_index = validate_columns(&headers)?;
    let [date_col, amount_col, merchant_col, description_col, category_col, source_col] =
        column_index;

    let mut transactions = Vec::new();

    for (idx, result) in rdr.records().enumerate() {
        let record = result?;
        let row_num = idx + 1;

        let raw_row = Some(record_to_json(&headers, &record));

        let date_str = record.get(date_col).unwrap_or_default();
        let date = parse_date(date_str)
            .map_err(|e| Error::Ingest(format!("row {}: {}", row_num, e)))?;

        let amount_str = record.get(amount_col).unwrap_or_default();
        let amount = parse_amount(amount_str)
            .map_err(|e| Error::Ingest(format!("row {}: {}", row_num, e)))?;

        transactions.push(NewTransaction {
            date,
            year_month: YearMonth::of(date),
            amount,
            merchant: non_empty(record.get(merchant_col)),
            description: non_empty(record.get(description_col)),
            category: non_empty(record.get(category_col)),
            source: non_empty(record.get(source_col)),
            raw_row,
        });
    }

    debug!("Parsed {} transactions", transactions.len());
    Ok(transactions)
}

/// Check that every required column is present; return their indexes in
/// [`REQUIRED_COLUMNS`] order.
fn validate_columns(headers: &StringRecord) -> Result<[usize; 6]> {
    let mut indexes = [0usize; 6];
    let mut missing = Vec::new();

    for (slot, required) in REQUIRED_COLUMNS.iter().enumerate() {
        match headers.iter().position(|h| h.trim() == *required) {
            Some(i) => indexes[slot] = i,
            None => missing.push(*required),
        }
    }

    if !missing.is_empty() {
        let found: Vec<&str> = headers.iter().collect();
        return Err(Error::Ingest(format!(
            "missing required columns: {:?}; found columns: {:?}; required (case-sensitive): {:?}",
            missing, found, REQUIRED_COLUMNS
        )));
    }

    Ok(indexes)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Parse an export date.
///
/// The export's native format is `"Tue, 24 Jun 2025"`; plain ISO and
/// day-month-year forms are accepted as fallbacks. A weekday prefix that
/// contradicts the date is ignored rather than rejected - exports get
/// hand-edited, and the calendar date is the part that matters.
fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return Err(Error::InvalidData("empty date string".to_string()));
    }

    let formats = [
        "%a, %d %b %Y", // Tue, 24 Jun 2025
        "%Y-%m-%d",     // 2025-06-24
        "%d %b %Y",     // 24 Jun 2025
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    // Strip a (possibly wrong) weekday prefix and retry on the remainder.
    if let Some((_, rest)) = s.split_once(", ") {
        if let Ok(date) = NaiveDate::parse_from_str(rest.trim(), "%d %b %Y") {
            return Ok(date);
        }
    }

    Err(Error::InvalidData(format!(
        "unable to parse date '{}' (expected e.g. 'Tue, 24 Jun 2025')",
        s
    )))
}
