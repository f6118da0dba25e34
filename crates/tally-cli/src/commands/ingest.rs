//! CSV replace-ingestion command

use std::path::Path;

use anyhow::{Context, Result};

use tally_core::{file_fingerprint, parse_csv, Database};

pub fn cmd_ingest(db: &Database, file: &Path) -> Result<()> {
    let content = std::fs::read(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let file_hash = file_fingerprint(&content);
    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.display().to_string());

    let rows = match parse_csv(content.as_slice()) {
        Ok(rows) => rows,
        Err(e) => {
            db.record_failed_ingest(&filename, Some(&file_hash), 0, &e.to_string())?;
            return Err(e).with_context(|| format!("Failed to parse {}", file.display()));
        }
    };

    let summary = db.replace_transactions(&filename, &file_hash, &rows)?;

    println!();
    println!("✅ Ingested {} ({} rows)", filename, summary.row_count);
    if let (Some(min), Some(max)) = (summary.date_min, summary.date_max) {
        println!("   Date range: {} to {}", min, max);
    }
    if !summary.categories_seen.is_empty() {
        println!("   Categories: {}", summary.categories_seen.join(", "));
    }
    if !summary.sources_seen.is_empty() {
        println!("   Sources:    {}", summary.sources_seen.join(", "));
    }
    println!();
    println!("   Note: expenses are positive amounts, income/settlements are negative.");

    Ok(())
}
