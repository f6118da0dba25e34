//! Monthly summary command

use anyhow::Result;

use tally_core::money::format_amount;
use tally_core::{Database, YearMonth};

use super::truncate;

pub fn cmd_summary(db: &Database, month: &str, top_k: i64) -> Result<()> {
    anyhow::ensure!(top_k > 0, "top-k must be positive");

    let month: YearMonth = month.parse()?;
    let report = db.monthly_summary_report(month, top_k)?;

    println!();
    println!("📅 Summary for {}", report.month);
    println!("   ─────────────────────────────────────────────");
    println!(
        "   Spent:  {} across {} transactions",
        format_amount(report.totals.expense_total),
        report.totals.transaction_count
    );
    println!("   Income: {}", format_amount(report.totals.income_total));
    println!("   Net:    {}", format_amount(report.totals.net_total));

    if !report.by_category.is_empty() {
        println!();
        println!("   By category:");
        for entry in &report.by_category {
            println!(
                "   {:>12} │ {}",
                format_amount(entry.expense_total),
                entry.category
            );
        }
    }

    if !report.top_merchants.is_empty() {
        println!();
        println!("   Top merchants:");
        for entry in &report.top_merchants {
            println!(
                "   {:>12} │ {:<25} ({} transactions)",
                format_amount(entry.expense_total),
                truncate(&entry.merchant, 25),
                entry.count
            );
        }
    }

    if !report.by_source.is_empty() {
        println!();
        println!("   By source:");
        for entry in &report.by_source {
            println!(
                "   {:>12} │ {}",
                format_amount(entry.expense_total),
                entry.source
            );
        }
    }

    Ok(())
}
