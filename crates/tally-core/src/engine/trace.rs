//! Structured audit record of how an answer was derived
//!
//! Strictly a recorder: the builder collects what the pipeline already
//! decided and computes nothing itself.

use serde::{Deserialize, Serialize};

use crate::db::TxnFilter;
use crate::month::YearMonth;

/// The audit record returned with every response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub intent: String,
    pub resolved_month: Option<YearMonth>,
    pub filters_used: TxnFilter,
    /// Function names in invocation order (dispatch, metric, evidence).
    pub called_functions: Vec<String>,
    /// Rows actually included in the response after truncation.
    pub evidence_count_returned: i64,
    pub notes: Vec<String>,
}

/// Accumulates trace fields as the pipeline advances.
#[derive(Debug, Default)]
pub struct TraceBuilder {
    intent: String,
    resolved_month: Option<YearMonth>,
    filters_used: TxnFilter,
    called_functions: Vec<String>,
    notes: Vec<String>,
}

impl TraceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intent(&mut self, name: &str) {
        self.intent = name.to_string();
    }

    pub fn month(&mut self, month: Option<YearMonth>) {
        self.resolved_month = month;
    }

    pub fn filters(&mut self, filter: &TxnFilter) {
        self.filters_used = filter.clone();
    }

    pub fn called(&mut self, function: &str) {
        self.called_functions.push(function.to_string());
    }

    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn finish(self, evidence_count_returned: i64) -> Trace {
        Trace {
            intent: self.intent,
            resolved_month: self.resolved_month,
            filters_used: self.filters_used,
            called_functions: self.called_functions,
            evidence_count_returned,
            notes: self.notes,
        }
    }
}
