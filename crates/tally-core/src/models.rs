//! Domain models for Tally

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::month::YearMonth;

/// A normalized financial transaction.
///
/// Rows are immutable once ingested; the only mutation the store supports
/// is the wholesale replace performed by ingestion.
///
/// Sign convention (carried through from the export format): expenses are
/// positive amounts, income and settlements are negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub ingest_id: i64,
    pub date: NaiveDate,
    /// Calendar month of `date`, denormalized for month filtering.
    pub year_month: YearMonth,
    pub amount: Decimal,
    /// The "Where?" column: merchant or counterparty name.
    pub merchant: Option<String>,
    /// The "What?" column: free-text description.
    pub description: Option<String>,
    pub category: Option<String>,
    /// Payment source: account or card name.
    pub source: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A transaction parsed from a CSV export, ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub year_month: YearMonth,
    pub amount: Decimal,
    pub merchant: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub source: Option<String>,
    /// Original CSV row as JSON, kept for audit.
    pub raw_row: Option<String>,
}

/// Transaction direction, derived from the amount sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxnKind {
    /// Positive amounts
    Expense,
    /// Negative amounts
    Income,
}

impl TxnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
        }
    }
}

impl std::str::FromStr for TxnKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "expense" => Ok(Self::Expense),
            "income" => Ok(Self::Income),
            _ => Err(format!("Unknown transaction kind: {}", s)),
        }
    }
}

impl std::fmt::Display for TxnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a replace-ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestStatus {
    Success,
    Failed,
}

impl IngestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl std::str::FromStr for IngestStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Unknown ingest status: {}", s)),
        }
    }
}

impl std::fmt::Display for IngestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded ingestion attempt, successful or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRecord {
    pub id: i64,
    pub filename: String,
    /// SHA-256 of the raw file content.
    pub file_hash: Option<String>,
    pub row_count: i64,
    pub status: IngestStatus,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Summary returned to the caller after a successful replace-ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestSummary {
    pub ingest_id: i64,
    pub row_count: i64,
    pub date_min: Option<NaiveDate>,
    pub date_max: Option<NaiveDate>,
    pub categories_seen: Vec<String>,
    pub sources_seen: Vec<String>,
}

/// A transaction row included as evidence for a computed answer.
///
/// Serialized field names (`where`, `what`) match the export columns the
/// user already knows from their spreadsheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRow {
    pub transaction_id: i64,
    pub date: NaiveDate,
    #[serde(rename = "where")]
    pub merchant: Option<String>,
    #[serde(rename = "what")]
    pub description: Option<String>,
    pub amount: Decimal,
    pub category: Option<String>,
    pub source: Option<String>,
}

/// The distinct entity names present in the active dataset.
///
/// Entity resolution only ever matches against this; a name that is not
/// here cannot silently become a filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vocabulary {
    pub categories: Vec<String>,
    pub merchants: Vec<String>,
    pub sources: Vec<String>,
}
