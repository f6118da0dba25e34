//! Monthly summary analytics
//!
//! Fixed reports over one calendar month: overall totals, expense
//! breakdowns by category and source, and top merchants. These back the
//! summary endpoint and CLI command; the question pipeline has its own
//! metric functions. The full report runs against one snapshot so its
//! sections describe the same dataset.

use rusqlite::params;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Database, TxnFilter};
use crate::error::Result;
use crate::money::from_cents;
use crate::month::YearMonth;

/// Overall figures for one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotals {
    pub expense_total: Decimal,
    pub income_total: Decimal,
    pub net_total: Decimal,
    pub transaction_count: i64,
}

/// Expense total for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpend {
    pub category: String,
    pub expense_total: Decimal,
}

/// Expense total and transaction count for one merchant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantSpend {
    pub merchant: String,
    pub expense_total: Decimal,
    pub count: i64,
}

/// Expense total for one payment source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSpend {
    pub source: String,
    pub expense_total: Decimal,
}

/// The full monthly report served by the summary endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlySummaryReport {
    pub month: YearMonth,
    pub totals: MonthlyTotals,
    pub by_category: Vec<CategorySpend>,
    pub top_merchants: Vec<MerchantSpend>,
    pub by_source: Vec<SourceSpend>,
}

impl Database {
    /// Expense, income, net, and row count for a month.
    pub fn monthly_totals(&self, month: YearMonth) -> Result<MonthlyTotals> {
        let agg = self.aggregate(&TxnFilter::new().month(Some(month)))?;
        Ok(MonthlyTotals {
            expense_total: agg.expense,
            income_total: agg.income,
            net_total: agg.total,
            transaction_count: agg.count,
        })
    }

    /// Expense totals grouped by category, largest first.
    /// Rows without a category are skipped.
    pub fn category_breakdown(&self, month: YearMonth) -> Result<Vec<CategorySpend>> {
        category_breakdown_on(&*self.conn()?, month)
    }

    /// Top `k` merchants by expense total for a month.
    pub fn top_merchants(&self, month: YearMonth, k: i64) -> Result<Vec<MerchantSpend>> {
        top_merchants_on(&*self.conn()?, month, k)
    }

    /// Expense totals grouped by payment source, largest first.
    pub fn source_breakdown(&self, month: YearMonth) -> Result<Vec<SourceSpend>> {
        source_breakdown_on(&*self.conn()?, month)
    }

    /// Assemble the full monthly report from one consistent snapshot.
    pub fn monthly_summary_report(
        &self,
        month: YearMonth,
        top_k: i64,
    ) -> Result<MonthlySummaryReport> {
        let snapshot = self.snapshot()?;

        let agg = snapshot.aggregate(&TxnFilter::new().month(Some(month)))?;
        let totals = MonthlyTotals {
            expense_total: agg.expense,
            income_total: agg.income,
            net_total: agg.total,
            transaction_count: agg.count,
        };

        Ok(MonthlySummaryReport {
            month,
            totals,
            by_category: category_breakdown_on(snapshot.conn(), month)?,
            top_merchants: top_merchants_on(snapshot.conn(), month, top_k)?,
            by_source: source_breakdown_on(snapshot.conn(), month)?,
        })
    }
}

fn category_breakdown_on(
    conn: &rusqlite::Connection,
    month: YearMonth,
) -> Result<Vec<CategorySpend>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT t.category, SUM(t.amount_cents)
        FROM transactions t
        WHERE t.year_month = ?1 AND t.amount_cents > 0 AND t.category IS NOT NULL
        GROUP BY t.category
        ORDER BY SUM(t.amount_cents) DESC, t.category ASC
        "#,
    )?;

    let rows = stmt
        .query_map(params![month.to_string()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows
        .into_iter()
        .map(|(category, cents)| CategorySpend {
            category,
            expense_total: from_cents(cents),
        })
        .collect())
}

fn top_merchants_on(
    conn: &rusqlite::Connection,
    month: YearMonth,
    k: i64,
) -> Result<Vec<MerchantSpend>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT t.merchant, SUM(t.amount_cents), COUNT(*)
        FROM transactions t
        WHERE t.year_month = ?1 AND t.amount_cents > 0 AND t.merchant IS NOT NULL
        GROUP BY t.merchant
        ORDER BY SUM(t.amount_cents) DESC, t.merchant ASC
        LIMIT ?2
        "#,
    )?;

    let rows = stmt
        .query_map(params![month.to_string(), k], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows
        .into_iter()
        .map(|(merchant, cents, count)| MerchantSpend {
            merchant,
            expense_total: from_cents(cents),
            count,
        })
        .collect())
}

fn source_breakdown_on(
    conn: &rusqlite::Connection,
    month: YearMonth,
) -> Result<Vec<SourceSpend>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT t.source, SUM(t.amount_cents)
        FROM transactions t
        WHERE t.year_month = ?1 AND t.amount_cents > 0 AND t.source IS NOT NULL
        GROUP BY t.source
        ORDER BY SUM(t.amount_cents) DESC, t.source ASC
        "#,
    )?;

    let rows = stmt
        .query_map(params![month.to_string()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows
        .into_iter()
        .map(|(source, cents)| SourceSpend {
            source,
            expense_total: from_cents(cents),
        })
        .collect())
}
