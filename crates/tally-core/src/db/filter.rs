//! Transaction filter: the single predicate shared by metrics and evidence
//!
//! Every filter field that is set becomes one `AND` condition. The metric
//! aggregate and the evidence selection both go through [`TxnFilter::to_sql`],
//! so the two can never disagree about which rows a request is talking about.
//! That shared routine is the consistency contract; do not hand-write a
//! second WHERE clause over the transactions table.

use serde::{Deserialize, Serialize};

use crate::models::TxnKind;
use crate::month::YearMonth;

/// Resolved query constraints for one request.
///
/// The same instance is handed to the metric function and the evidence
/// selector; it is cheap to clone and compare.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TxnFilter {
    /// Calendar month of the transaction date.
    pub month: Option<YearMonth>,
    /// Exact category name.
    pub category: Option<String>,
    /// Exact merchant name (the "Where?" column).
    pub merchant: Option<String>,
    /// Exact source name.
    pub source: Option<String>,
    /// Direction constraint; `None` matches both signs.
    pub kind: Option<TxnKind>,
}

/// SQL components built from a filter.
pub struct FilterSql {
    /// WHERE clause including the `WHERE` keyword (empty if unconstrained).
    pub where_clause: String,
    /// Bound parameters, in clause order.
    pub params: Vec<Box<dyn rusqlite::ToSql>>,
}

impl FilterSql {
    /// Parameter references for query execution.
    pub fn params_refs(&self) -> Vec<&dyn rusqlite::ToSql> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}

impl TxnFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn month(mut self, month: Option<YearMonth>) -> Self {
        self.month = month;
        self
    }

    pub fn category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    pub fn merchant(mut self, merchant: Option<String>) -> Self {
        self.merchant = merchant;
        self
    }

    pub fn source(mut self, source: Option<String>) -> Self {
        self.source = source;
        self
    }

    pub fn kind(mut self, kind: Option<TxnKind>) -> Self {
        self.kind = kind;
        self
    }

    /// Build the WHERE clause and parameters for this filter.
    ///
    /// Field semantics: exact equality, case-sensitive, except `month`
    /// which matches the denormalized `year_month` column and `kind`
    /// which constrains the amount sign.
    pub fn to_sql(&self) -> FilterSql {
        let mut conditions: Vec<&'static str> = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(month) = self.month {
            conditions.push("t.year_month = ?");
            params.push(Box::new(month.to_string()));
        }

        if let Some(ref category) = self.category {
            conditions.push("t.category = ?");
            params.push(Box::new(category.clone()));
        }

        if let Some(ref merchant) = self.merchant {
            conditions.push("t.merchant = ?");
            params.push(Box::new(merchant.clone()));
        }

        if let Some(ref source) = self.source {
            conditions.push("t.source = ?");
            params.push(Box::new(source.clone()));
        }

        match self.kind {
            Some(TxnKind::Expense) => conditions.push("t.amount_cents > 0"),
            Some(TxnKind::Income) => conditions.push("t.amount_cents < 0"),
            None => {}
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        FilterSql {
            where_clause,
            params,
        }
    }
}
