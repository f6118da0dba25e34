//! Question answering command

use anyhow::Result;

use tally_core::money::format_amount;
use tally_core::{Database, EngineConfig, QueryEngine, YearMonth};

use super::truncate;

pub fn cmd_ask(
    db: &Database,
    question: &str,
    month: Option<&str>,
    limit: i64,
    show_trace: bool,
) -> Result<()> {
    anyhow::ensure!(limit > 0, "limit must be a positive number of rows");

    let month = month.map(str::parse::<YearMonth>).transpose()?;
    let engine = QueryEngine::with_config(db.clone(), EngineConfig::from_env());
    let response = engine.query(question, month, Some(limit))?;

    println!();
    if let Some(clarification) = &response.clarifying_question {
        println!("❓ {}", clarification);
        return Ok(());
    }

    if let Some(answer) = &response.final_answer {
        println!("💬 {}", answer);
    }

    if !response.numbers.is_empty() {
        println!();
        println!("   Numbers:");
        for (name, value) in &response.numbers {
            println!("   {:>18}: {}", name, value);
        }
    }

    if !response.evidence.is_empty() {
        println!();
        println!(
            "   Evidence ({} of {} matching):",
            response.evidence.len(),
            response
                .numbers
                .get("count")
                .or_else(|| response.numbers.get("transaction_count"))
                .map(|c| c.to_string())
                .unwrap_or_else(|| response.evidence.len().to_string())
        );
        println!("   ─────────────────────────────────────────────────────────────");
        for row in &response.evidence {
            println!(
                "   {} │ {:>12} │ {:<20} │ {}",
                row.date,
                format_amount(row.amount),
                truncate(row.merchant.as_deref().unwrap_or("-"), 20),
                row.category.as_deref().unwrap_or("-")
            );
        }
    }

    if show_trace {
        println!();
        println!("   Trace:");
        println!("{}", serde_json::to_string_pretty(&response.trace)?);
    }

    Ok(())
}
