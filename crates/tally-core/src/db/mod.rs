//! Database access layer: connection pooling, migrations, and the
//! transaction store
//!
//! Organized by concern:
//! - `filter` - the shared filter predicate (metrics and evidence)
//! - `transactions` - replace-ingestion, vocabulary, aggregate, evidence
//! - `summary` - monthly report analytics
//!
//! The store is read-only from the engine's perspective. The only write
//! path is replace-ingestion, which swaps the whole dataset inside one
//! exclusive SQLite transaction; with WAL mode, in-flight readers observe
//! either the fully-old or the fully-new dataset, never a partial state.

use chrono::{DateTime, NaiveDate, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;

use crate::error::{Error, Result};

mod filter;
mod summary;
mod transactions;

pub use filter::{FilterSql, TxnFilter};
pub use summary::{
    CategorySpend, MerchantSpend, MonthlySummaryReport, MonthlyTotals, SourceSpend,
};
pub use transactions::Aggregate;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// A consistent read view of the store.
///
/// Wraps one pooled connection inside a deferred read transaction: every
/// query issued through the snapshot sees the dataset as of the first
/// read, even if a replace-ingestion commits meanwhile. A whole request
/// (vocabulary, metric, evidence) runs against one snapshot so its three
/// outputs can never straddle a swap.
pub struct Snapshot {
    conn: DbConn,
}

impl Snapshot {
    fn begin(conn: DbConn) -> Result<Self> {
        conn.execute_batch("BEGIN")?;
        Ok(Self { conn })
    }

    pub(crate) fn conn(&self) -> &rusqlite::Connection {
        &self.conn
    }
}

impl Drop for Snapshot {
    fn drop(&mut self) {
        // Read-only transaction; COMMIT just releases the snapshot.
        let _ = self.conn.execute_batch("COMMIT");
    }
}

/// Parse a SQLite datetime string ("YYYY-MM-DD HH:MM:SS") into UTC.
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Parse a stored "YYYY-MM-DD" date column.
pub(crate) fn parse_date_column(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| Error::InvalidData(format!("bad date in store: {}", s)))
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Open (creating if needed) a database at the given path and run
    /// migrations.
    pub fn open(path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Path to the database file.
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create a throwaway database for tests.
    ///
    /// Uses a unique temp file rather than `:memory:` so every pooled
    /// connection sees the same database.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!("tally_test_{}_{}.db", std::process::id(), id));
        let _ = std::fs::remove_file(&path);

        Self::open(&path.to_string_lossy())
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Open a consistent read view for one request.
    pub fn snapshot(&self) -> Result<Snapshot> {
        Snapshot::begin(self.conn()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            -- WAL mode: readers keep a consistent snapshot while the
            -- replace-ingestion transaction commits.
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;

            -- Ingestion history (append-only; one row per attempt)
            CREATE TABLE IF NOT EXISTS ingests (
                id INTEGER PRIMARY KEY,
                filename TEXT NOT NULL,
                file_hash TEXT,
                row_count INTEGER NOT NULL,
                status TEXT NOT NULL,
                error TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            -- The active dataset. Replaced wholesale by ingestion,
            -- never mutated row-by-row. Amounts are integer cents.
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY,
                ingest_id INTEGER REFERENCES ingests(id),
                date DATE NOT NULL,
                year_month TEXT NOT NULL,
                amount_cents INTEGER NOT NULL,
                merchant TEXT,
                description TEXT,
                category TEXT,
                source TEXT,
                raw_row TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
            CREATE INDEX IF NOT EXISTS idx_transactions_year_month ON transactions(year_month);

            -- Composite indexes for the entity + month filters
            CREATE INDEX IF NOT EXISTS idx_transactions_category_month
                ON transactions(category, year_month);
            CREATE INDEX IF NOT EXISTS idx_transactions_merchant_month
                ON transactions(merchant, year_month);
            CREATE INDEX IF NOT EXISTS idx_transactions_source_month
                ON transactions(source, year_month);
            "#,
        )?;

        Ok(())
    }
}
