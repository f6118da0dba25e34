//! Replace-ingestion, vocabulary, and the two filter consumers
//! (aggregate and evidence)

use rusqlite::{params, TransactionBehavior};
use rust_decimal::Decimal;
use tracing::info;

use super::{parse_date_column, parse_datetime, Database, Snapshot, TxnFilter};
use crate::error::Result;
use crate::models::{
    EvidenceRow, IngestRecord, IngestStatus, IngestSummary, NewTransaction, Transaction,
    Vocabulary,
};
use crate::money::{from_cents, to_cents};

/// Sums and row count over one filtered view of the store.
///
/// All four figures come out of a single query over the same WHERE clause,
/// so they describe exactly one set of rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    /// Sum of all matching amounts (net when both signs match).
    pub total: Decimal,
    /// Sum of positive matching amounts.
    pub expense: Decimal,
    /// Sum of negative matching amounts.
    pub income: Decimal,
    /// Number of matching rows, unlimited.
    pub count: i64,
}

impl Database {
    /// Atomically replace the active dataset with `rows`.
    ///
    /// Runs as one IMMEDIATE transaction: clear, bulk-insert, record the
    /// ingest. Concurrent ingests serialize on the write lock; concurrent
    /// queries read the pre-commit snapshot until the swap is published.
    pub fn replace_transactions(
        &self,
        filename: &str,
        file_hash: &str,
        rows: &[NewTransaction],
    ) -> Result<IngestSummary> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute("DELETE FROM transactions", [])?;

        tx.execute(
            "INSERT INTO ingests (filename, file_hash, row_count, status) VALUES (?1, ?2, ?3, ?4)",
            params![
                filename,
                file_hash,
                rows.len() as i64,
                IngestStatus::Success.as_str()
            ],
        )?;
        let ingest_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO transactions
                    (ingest_id, date, year_month, amount_cents, merchant, description, category, source, raw_row)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )?;

            for row in rows {
                stmt.execute(params![
                    ingest_id,
                    row.date.to_string(),
                    row.year_month.to_string(),
                    to_cents(row.amount)?,
                    row.merchant,
                    row.description,
                    row.category,
                    row.source,
                    row.raw_row,
                ])?;
            }
        }

        tx.commit()?;

        info!(
            filename,
            rows = rows.len(),
            ingest_id,
            "Replaced active dataset"
        );

        Ok(build_ingest_summary(ingest_id, rows))
    }

    /// Record a failed ingestion attempt without touching the dataset.
    pub fn record_failed_ingest(
        &self,
        filename: &str,
        file_hash: Option<&str>,
        row_count: i64,
        error: &str,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO ingests (filename, file_hash, row_count, status, error) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                filename,
                file_hash,
                row_count,
                IngestStatus::Failed.as_str(),
                error
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Ingestion history, most recent first.
    pub fn list_ingests(&self, limit: i64) -> Result<Vec<IngestRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, filename, file_hash, row_count, status, error, created_at
             FROM ingests ORDER BY id DESC LIMIT ?1",
        )?;

        let records = stmt
            .query_map([limit], |row| {
                let status: String = row.get(4)?;
                let created_at: String = row.get(6)?;
                Ok(IngestRecord {
                    id: row.get(0)?,
                    filename: row.get(1)?,
                    file_hash: row.get(2)?,
                    row_count: row.get(3)?,
                    status: status.parse().unwrap_or(IngestStatus::Failed),
                    error: row.get(5)?,
                    created_at: parse_datetime(&created_at),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(records)
    }

    /// Number of rows in the active dataset.
    pub fn transaction_count(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        Ok(count)
    }

    /// List transactions, most recent first.
    pub fn list_transactions(&self, limit: i64) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, ingest_id, date, year_month, amount_cents, merchant, description,
                    category, source, created_at
             FROM transactions ORDER BY date DESC, id DESC LIMIT ?1",
        )?;

        let rows = stmt
            .query_map([limit], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, Option<String>>(7)?,
                    row.get::<_, Option<String>>(8)?,
                    row.get::<_, String>(9)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut transactions = Vec::with_capacity(rows.len());
        for (id, ingest_id, date, year_month, cents, merchant, description, category, source, created_at) in
            rows
        {
            transactions.push(Transaction {
                id,
                ingest_id,
                date: parse_date_column(&date)?,
                year_month: year_month.parse()?,
                amount: from_cents(cents),
                merchant,
                description,
                category,
                source,
                created_at: parse_datetime(&created_at),
            });
        }

        Ok(transactions)
    }

    /// Distinct entity names currently present in the dataset.
    pub fn vocabulary(&self) -> Result<Vocabulary> {
        vocabulary_on(&*self.conn()?)
    }

    /// Compute sums and count for the rows matching `filter`.
    pub fn aggregate(&self, filter: &TxnFilter) -> Result<Aggregate> {
        aggregate_on(&*self.conn()?, filter)
    }

    /// Fetch the rows matching `filter`, most recent first, up to `limit`.
    pub fn evidence(&self, filter: &TxnFilter, limit: i64) -> Result<Vec<EvidenceRow>> {
        evidence_on(&*self.conn()?, filter, limit)
    }
}

impl Snapshot {
    /// Distinct entity names as of this snapshot.
    pub fn vocabulary(&self) -> Result<Vocabulary> {
        vocabulary_on(self.conn())
    }

    /// Sums and count for `filter` as of this snapshot.
    pub fn aggregate(&self, filter: &TxnFilter) -> Result<Aggregate> {
        aggregate_on(self.conn(), filter)
    }

    /// Matching rows for `filter` as of this snapshot.
    pub fn evidence(&self, filter: &TxnFilter, limit: i64) -> Result<Vec<EvidenceRow>> {
        evidence_on(self.conn(), filter, limit)
    }
}

fn vocabulary_on(conn: &rusqlite::Connection) -> Result<Vocabulary> {
    let fetch = |column: &str| -> Result<Vec<String>> {
        let sql = format!(
            "SELECT DISTINCT {col} FROM transactions WHERE {col} IS NOT NULL ORDER BY {col}",
            col = column
        );
        let mut stmt = conn.prepare(&sql)?;
        let values = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(values)
    };

    Ok(Vocabulary {
        categories: fetch("category")?,
        merchants: fetch("merchant")?,
        sources: fetch("source")?,
    })
}

/// One query, one WHERE clause from [`TxnFilter::to_sql`]. Integer-cent
/// summation in SQLite is exact; the conversion back to `Decimal` happens
/// only at the boundary.
fn aggregate_on(conn: &rusqlite::Connection, filter: &TxnFilter) -> Result<Aggregate> {
    let sql = filter.to_sql();

    let query = format!(
        r#"
        SELECT COALESCE(SUM(t.amount_cents), 0),
               COALESCE(SUM(CASE WHEN t.amount_cents > 0 THEN t.amount_cents ELSE 0 END), 0),
               COALESCE(SUM(CASE WHEN t.amount_cents < 0 THEN t.amount_cents ELSE 0 END), 0),
               COUNT(*)
        FROM transactions t
        {}
        "#,
        sql.where_clause
    );

    let (total, expense, income, count): (i64, i64, i64, i64) =
        conn.query_row(&query, sql.params_refs().as_slice(), |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?;

    Ok(Aggregate {
        total: from_cents(total),
        expense: from_cents(expense),
        income: from_cents(income),
        count,
    })
}

/// Same filter object, same `to_sql` routine as [`aggregate_on`]; the
/// secondary `id DESC` ordering makes repeat queries byte-identical.
fn evidence_on(
    conn: &rusqlite::Connection,
    filter: &TxnFilter,
    limit: i64,
) -> Result<Vec<EvidenceRow>> {
    let mut sql = filter.to_sql();

    let query = format!(
        r#"
        SELECT t.id, t.date, t.merchant, t.description, t.amount_cents, t.category, t.source
        FROM transactions t
        {}
        ORDER BY t.date DESC, t.id DESC
        LIMIT ?
        "#,
        sql.where_clause
    );
    sql.params.push(Box::new(limit));

    let mut stmt = conn.prepare(&query)?;
    let rows = stmt
        .query_map(sql.params_refs().as_slice(), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, Option<String>>(6)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut evidence = Vec::with_capacity(rows.len());
    for (id, date, merchant, description, cents, category, source) in rows {
        evidence.push(EvidenceRow {
            transaction_id: id,
            date: parse_date_column(&date)?,
            merchant,
            description,
            amount: from_cents(cents),
            category,
            source,
        });
    }

    Ok(evidence)
}

fn build_ingest_summary(ingest_id: i64, rows: &[NewTransaction]) -> IngestSummary {
    let date_min = rows.iter().map(|r| r.date).min();
    let date_max = rows.iter().map(|r| r.date).max();

    // First-seen order, matching the file the user just handed us.
    let mut categories_seen = Vec::new();
    let mut sources_seen = Vec::new();
    for row in rows {
        if let Some(ref c) = row.category {
            if !categories_seen.contains(c) {
                categories_seen.push(c.clone());
            }
        }
        if let Some(ref s) = row.source {
            if !sources_seen.contains(s) {
                sources_seen.push(s.clone());
            }
        }
    }

    IngestSummary {
        ingest_id,
        row_count: rows.len() as i64,
        date_min,
        date_max,
        categories_seen,
        sources_seen,
    }
}
