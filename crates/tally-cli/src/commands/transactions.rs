//! Transaction listing command

use anyhow::Result;

use tally_core::money::format_amount;
use tally_core::Database;

use super::truncate;

pub fn cmd_transactions_list(db: &Database, limit: i64) -> Result<()> {
    let transactions = db.list_transactions(limit)?;

    if transactions.is_empty() {
        println!("No transactions found. Ingest a CSV export with:");
        println!("  tally ingest --file export.csv");
        return Ok(());
    }

    println!();
    println!("📝 Recent Transactions");
    println!("   ─────────────────────────────────────────────────────────────");

    for tx in transactions {
        let amount_str = if tx.amount.is_sign_negative() {
            // Income/settlements in green
            format!("\x1b[32m{}\x1b[0m", format_amount(tx.amount))
        } else {
            format!("\x1b[31m{}\x1b[0m", format_amount(tx.amount))
        };

        println!(
            "   {} │ {:>12} │ {:<20} │ {}",
            tx.date,
            amount_str,
            truncate(tx.merchant.as_deref().unwrap_or("-"), 20),
            truncate(tx.description.as_deref().unwrap_or("-"), 30)
        );
    }

    Ok(())
}
