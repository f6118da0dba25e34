//! Core commands: init, status, ingest history, serve

use std::path::Path;

use anyhow::Result;

use tally_core::Database;

/// Open the database at the given path.
pub fn open_db(path: &Path) -> Result<Database> {
    Ok(Database::open(&path.to_string_lossy())?)
}

pub fn cmd_init(path: &Path) -> Result<()> {
    let db = open_db(path)?;
    println!("✅ Database initialized at {}", db.path());
    println!();
    println!("Next steps:");
    println!("  tally ingest --file export.csv");
    println!("  tally ask \"How much did I spend on Food in 2025-06?\"");
    Ok(())
}

pub fn cmd_status(db: &Database) -> Result<()> {
    let count = db.transaction_count()?;
    let vocab = db.vocabulary()?;
    let ingests = db.list_ingests(1)?;

    println!();
    println!("📊 Tally Status");
    println!("   ─────────────────────────────────────────────");
    println!("   Database:     {}", db.path());
    println!("   Transactions: {}", count);
    println!(
        "   Vocabulary:   {} categories, {} merchants, {} sources",
        vocab.categories.len(),
        vocab.merchants.len(),
        vocab.sources.len()
    );

    match ingests.first() {
        Some(last) => println!(
            "   Last ingest:  {} ({} rows, {})",
            last.filename, last.row_count, last.status
        ),
        None => println!("   Last ingest:  none"),
    }

    Ok(())
}

pub fn cmd_ingests(db: &Database) -> Result<()> {
    let records = db.list_ingests(20)?;

    if records.is_empty() {
        println!("No ingests yet. Load a CSV with:");
        println!("  tally ingest --file export.csv");
        return Ok(());
    }

    println!();
    println!("📥 Ingestion History");
    println!("   ─────────────────────────────────────────────────────────────");

    for record in records {
        let status = match record.status {
            tally_core::IngestStatus::Success => "\x1b[32msuccess\x1b[0m",
            tally_core::IngestStatus::Failed => "\x1b[31mfailed \x1b[0m",
        };
        println!(
            "   [{}] {} │ {} │ {:>6} rows │ {}",
            record.id,
            record.created_at.format("%Y-%m-%d %H:%M"),
            status,
            record.row_count,
            super::truncate(&record.filename, 30)
        );
        if let Some(error) = record.error {
            println!("        ↳ {}", super::truncate(&error, 70));
        }
    }

    Ok(())
}

pub async fn cmd_serve(db: Database, host: &str, port: u16) -> Result<()> {
    println!("🚀 Tally server starting at http://{}:{}", host, port);
    tally_server::serve(db, host, port).await
}
