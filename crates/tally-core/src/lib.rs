//! Tally Core Library
//!
//! Deterministic question answering over a personal transaction store:
//! - SQLite-backed store with atomic replace-ingestion
//! - CSV ingestion for transaction exports
//! - Entity and intent resolution against the dataset vocabulary
//! - Pure metric functions over one shared filter predicate
//! - Evidence selection and trace assembly from the same filter
//!
//! Every answer, its evidence rows, and its trace are computed from a
//! single filter object, so the three can never drift apart. Amounts are
//! exact decimals end to end.

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod models;
pub mod money;
pub mod month;

pub use config::{EngineConfig, MonthPolicy};
pub use db::{Aggregate, Database, Snapshot, TxnFilter};
pub use engine::{
    ClarificationReason, Entities, EntityMatch, EvidenceSet, Intent, MatchConfidence,
    MetricResult, QueryEngine, Response, Slot, Trace,
};
pub use error::{Error, Result};
pub use ingest::{file_fingerprint, parse_csv, REQUIRED_COLUMNS};
pub use models::{
    EvidenceRow, IngestRecord, IngestStatus, IngestSummary, NewTransaction, Transaction, TxnKind,
    Vocabulary,
};
pub use month::YearMonth;
