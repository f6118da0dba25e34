//! Evidence selection: the rows behind a computed answer
//!
//! Uses the identical [`TxnFilter`] instance the metric ran under. The
//! truncation limit only affects how many rows are returned, never the
//! reported totals or counts.

use crate::db::{Snapshot, TxnFilter};
use crate::error::Result;
use crate::models::EvidenceRow;

/// The justifying rows for one answer.
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceSet {
    /// Matching rows, most recent first, truncated to the caller's limit.
    pub rows: Vec<EvidenceRow>,
    /// Untruncated matching count (the metric's `count`).
    pub matched: i64,
}

/// Fetch evidence for `filter`, truncated to `limit` rows.
///
/// `matched` is taken from the metric result computed under the same
/// filter rather than re-counted here; the two describe one row set by
/// construction.
pub fn select_evidence(
    store: &Snapshot,
    filter: &TxnFilter,
    limit: i64,
    matched: i64,
) -> Result<EvidenceSet> {
    let rows = store.evidence(filter, limit)?;
    Ok(EvidenceSet { rows, matched })
}
