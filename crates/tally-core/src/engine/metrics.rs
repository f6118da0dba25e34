//! Metric functions: pure `(store, filter) -> MetricResult`
//!
//! Every function delegates to [`Database::aggregate`], which runs the one
//! shared filter predicate. An empty matching set is a zero answer, never
//! an error.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::db::{Snapshot, TxnFilter};
use crate::error::Result;

/// A computed metric plus the named figures the response will carry.
///
/// `value` and `count` are pure functions of (store snapshot, `filter`);
/// recomputing with the same inputs yields the same result.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricResult {
    /// The headline figure for the request.
    pub value: Decimal,
    /// Number of matching rows, unlimited by any evidence cap.
    pub count: i64,
    /// Named figures for the response body. BTreeMap for stable key order.
    pub numbers: BTreeMap<String, Decimal>,
    /// The exact filter the figures were computed under.
    pub filter: TxnFilter,
}

/// Signature every metric function shares; dispatch stores these.
/// Metrics read through a [`Snapshot`] so one request sees one dataset.
pub type MetricFn = fn(&Snapshot, &TxnFilter) -> Result<MetricResult>;

/// Overall month figures: expense, income, net, row count.
/// The filter carries no kind, so `value` is the net over all rows and the
/// evidence (same filter) sums to exactly that.
pub fn monthly_summary(store: &Snapshot, filter: &TxnFilter) -> Result<MetricResult> {
    let agg = store.aggregate(filter)?;

    let mut numbers = BTreeMap::new();
    numbers.insert("expense_total".to_string(), agg.expense);
    numbers.insert("income_total".to_string(), agg.income);
    numbers.insert("net_total".to_string(), agg.total);
    numbers.insert("transaction_count".to_string(), Decimal::from(agg.count));

    Ok(MetricResult {
        value: agg.total,
        count: agg.count,
        numbers,
        filter: filter.clone(),
    })
}

/// Spend total for a single entity filter (category, merchant, or source).
/// The filter already constrains kind to expenses.
fn spend_total(store: &Snapshot, filter: &TxnFilter) -> Result<MetricResult> {
    let agg = store.aggregate(filter)?;

    let mut numbers = BTreeMap::new();
    numbers.insert("total".to_string(), agg.total);
    numbers.insert("count".to_string(), Decimal::from(agg.count));

    Ok(MetricResult {
        value: agg.total,
        count: agg.count,
        numbers,
        filter: filter.clone(),
    })
}

// Thin named wrappers so the trace records which metric ran.

pub fn category_total(store: &Snapshot, filter: &TxnFilter) -> Result<MetricResult> {
    spend_total(store, filter)
}

pub fn merchant_total(store: &Snapshot, filter: &TxnFilter) -> Result<MetricResult> {
    spend_total(store, filter)
}

pub fn source_total(store: &Snapshot, filter: &TxnFilter) -> Result<MetricResult> {
    spend_total(store, filter)
}
