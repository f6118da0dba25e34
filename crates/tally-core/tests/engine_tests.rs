//! Integration tests for tally-core
//!
//! These exercise the full ingest → ask workflow: a CSV export is
//! replace-ingested and questions run through the whole pipeline.

use rust_decimal::Decimal;
use std::str::FromStr;

use tally_core::{
    parse_csv, Database, EngineConfig, MonthPolicy, QueryEngine, Response, YearMonth,
};

/// Six Food transactions in June 2025 totaling 59.87, plus noise in other
/// categories, months, and an income row.
fn june_csv() -> &'static str {
    r#"Date,Amount,Where?,What?,Category,Source
"Sun, 01 Jun 2025",$6.15,Blue Bottle,Latte,Food,Amex
"Tue, 03 Jun 2025",$12.40,Corner Deli,Lunch,Food,Amex
"Sat, 07 Jun 2025",$18.22,Whole Foods,Groceries,Food,Checking
"Tue, 10 Jun 2025",$9.80,Corner Deli,Lunch,Food,Checking
"Sat, 14 Jun 2025",$4.30,Blue Bottle,Espresso,Food,Amex
"Tue, 24 Jun 2025",$9.00,Thai Palace,Dinner,Food,Amex
"Thu, 05 Jun 2025",$80.00,Shell,Gas,Transport,Checking
"Fri, 20 Jun 2025",-$500.00,Acme Payroll,Salary,Income,Checking
"Wed, 02 Jul 2025",$7.25,Blue Bottle,Latte,Food,Amex
"#
}

fn engine_with_june_data() -> QueryEngine {
    let db = Database::in_memory().expect("in-memory db");
    let rows = parse_csv(june_csv().as_bytes()).expect("parse fixture");
    db.replace_transactions("june.csv", "fixture-hash", &rows)
        .expect("replace");
    QueryEngine::new(db)
}

fn total(response: &Response) -> Decimal {
    *response.numbers.get("total").expect("numbers.total")
}

// =============================================================================
// Scenario: category total
// =============================================================================

#[test]
fn test_category_total_scenario() {
    let engine = engine_with_june_data();
    let response = engine
        .query("How much did I spend on Food in June 2025?", None, None)
        .unwrap();

    assert_eq!(
        response.final_answer.as_deref(),
        Some("You spent $59.87 on Food in 2025-06 across 6 transactions.")
    );
    assert!(response.clarifying_question.is_none());
    assert_eq!(total(&response), Decimal::from_str("59.87").unwrap());
    assert_eq!(
        response.numbers.get("count").copied(),
        Some(Decimal::from(6))
    );
    assert_eq!(response.evidence.len(), 6);

    assert_eq!(response.trace.intent, "category_total");
    assert_eq!(
        response.trace.resolved_month.map(|m| m.to_string()),
        Some("2025-06".to_string())
    );
    assert_eq!(
        response.trace.called_functions,
        vec!["dispatch", "category_total", "select_evidence"]
    );
    assert_eq!(response.trace.evidence_count_returned, 6);
    assert_eq!(
        response.trace.filters_used.category.as_deref(),
        Some("Food")
    );
}

#[test]
fn test_evidence_limit_truncates_rows_but_not_numbers() {
    let engine = engine_with_june_data();
    let response = engine
        .query("How much did I spend on Food in 2025-06?", None, Some(2))
        .unwrap();

    assert_eq!(response.evidence.len(), 2);
    assert_eq!(response.trace.evidence_count_returned, 2);
    // Totals still describe the full matching set
    assert_eq!(total(&response), Decimal::from_str("59.87").unwrap());
    assert_eq!(
        response.numbers.get("count").copied(),
        Some(Decimal::from(6))
    );
}

// =============================================================================
// Consistency: answer, evidence, and trace come from one filter
// =============================================================================

#[test]
fn test_evidence_sums_to_reported_value() {
    let engine = engine_with_june_data();

    for question in [
        "How much did I spend on Food in 2025-06?",
        "How much at Blue Bottle in 2025-06?",
        "How much did I spend using Amex in 2025-06?",
    ] {
        let response = engine.query(question, None, Some(1000)).unwrap();
        let evidence_sum: Decimal = response.evidence.iter().map(|r| r.amount).sum();
        assert_eq!(
            evidence_sum,
            total(&response),
            "evidence and value diverged for: {}",
            question
        );
        assert_eq!(
            Decimal::from(response.evidence.len() as i64),
            response.numbers["count"],
            "evidence length and count diverged for: {}",
            question
        );
    }
}

#[test]
fn test_monthly_summary_net_matches_evidence() {
    let engine = engine_with_june_data();
    let response = engine
        .query("How much did I spend in 2025-06?", None, Some(1000))
        .unwrap();

    assert_eq!(response.trace.intent, "monthly_summary");
    let evidence_sum: Decimal = response.evidence.iter().map(|r| r.amount).sum();
    assert_eq!(evidence_sum, response.numbers["net_total"]);
    assert_eq!(
        response.numbers["transaction_count"],
        Decimal::from(response.evidence.len() as i64)
    );
    assert_eq!(
        response.numbers["expense_total"],
        Decimal::from_str("139.87").unwrap()
    );
    assert_eq!(
        response.numbers["income_total"],
        Decimal::from_str("-500.00").unwrap()
    );
}

// =============================================================================
// Idempotence
// =============================================================================

#[test]
fn test_identical_queries_are_byte_identical() {
    let engine = engine_with_june_data();
    let question = "How much did I spend on Food in 2025-06?";

    let a = engine.query(question, None, Some(3)).unwrap();
    let b = engine.query(question, None, Some(3)).unwrap();

    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

// =============================================================================
// Clarifications
// =============================================================================

#[test]
fn test_no_entities_no_month_clarifies() {
    let engine = engine_with_june_data();
    let response = engine.query("what's up with my money", None, None).unwrap();

    assert!(response.final_answer.is_none());
    assert!(response.clarifying_question.is_some());
    assert!(response.numbers.is_empty());
    assert!(response.evidence.is_empty());
    assert_eq!(response.trace.intent, "clarification_needed");
}

#[test]
fn test_category_without_month_clarifies_by_default() {
    let engine = engine_with_june_data();
    let response = engine
        .query("How much did I spend on Food?", None, None)
        .unwrap();

    assert!(response.final_answer.is_none());
    let q = response.clarifying_question.unwrap();
    assert!(q.contains("YYYY-MM"), "unexpected question: {}", q);
    assert_eq!(response.trace.intent, "category_total");
}

#[test]
fn test_category_without_month_all_time_policy_answers() {
    let db = Database::in_memory().unwrap();
    let rows = parse_csv(june_csv().as_bytes()).unwrap();
    db.replace_transactions("june.csv", "fixture-hash", &rows)
        .unwrap();
    let config = EngineConfig {
        month_policy: MonthPolicy::AllTime,
        ..EngineConfig::default()
    };
    let engine = QueryEngine::with_config(db, config);

    let response = engine
        .query("How much did I spend on Food?", None, None)
        .unwrap();

    assert!(response.clarifying_question.is_none());
    // June's 59.87 plus July's 7.25
    assert_eq!(total(&response), Decimal::from_str("67.12").unwrap());
    assert_eq!(response.trace.resolved_month, None);
    assert!(response
        .final_answer
        .as_deref()
        .unwrap()
        .contains("all time"));
}

#[test]
fn test_unknown_merchant_clarifies_instead_of_zero() {
    let engine = engine_with_june_data();
    let response = engine
        .query("How much did I spend at Starbs in 2025-06?", None, None)
        .unwrap();

    assert!(response.final_answer.is_none());
    let q = response.clarifying_question.unwrap();
    assert!(q.contains("Starbs"), "unexpected question: {}", q);
    assert!(response.evidence.is_empty());
}

#[test]
fn test_explicit_month_overrides_text_month() {
    let engine = engine_with_june_data();
    let month: YearMonth = "2025-07".parse().unwrap();
    let response = engine
        .query(
            "How much did I spend on Food in 2025-06?",
            Some(month),
            None,
        )
        .unwrap();

    assert_eq!(
        response.trace.resolved_month.map(|m| m.to_string()),
        Some("2025-07".to_string())
    );
    assert_eq!(total(&response), Decimal::from_str("7.25").unwrap());
}

// =============================================================================
// Priority tie-break
// =============================================================================

#[test]
fn test_category_and_merchant_resolves_to_category() {
    let engine = engine_with_june_data();
    let response = engine
        .query(
            "How much did I spend on Food at Blue Bottle in 2025-06?",
            None,
            None,
        )
        .unwrap();

    assert_eq!(response.trace.intent, "category_total");
    // Category filter only; the merchant mention is not applied
    assert_eq!(
        response.trace.filters_used.category.as_deref(),
        Some("Food")
    );
    assert_eq!(response.trace.filters_used.merchant, None);
    assert_eq!(total(&response), Decimal::from_str("59.87").unwrap());
}

// =============================================================================
// Zero-match month
// =============================================================================

#[test]
fn test_zero_match_month_is_an_answer() {
    let engine = engine_with_june_data();
    let response = engine
        .query("How much did I spend on Food in 1999-01?", None, None)
        .unwrap();

    assert!(response.clarifying_question.is_none());
    let answer = response.final_answer.as_deref().unwrap();
    assert!(answer.contains("$0.00"), "unexpected answer: {}", answer);
    assert_eq!(total(&response), Decimal::ZERO);
    assert_eq!(response.numbers["count"], Decimal::ZERO);
    assert!(response.evidence.is_empty());
}

// =============================================================================
// Replace atomicity (old-or-new, never mixed)
// =============================================================================

#[test]
fn test_queries_see_old_then_new_dataset() {
    let db = Database::in_memory().unwrap();
    let engine = QueryEngine::new(db.clone());

    let rows = parse_csv(june_csv().as_bytes()).unwrap();
    db.replace_transactions("june.csv", "h1", &rows).unwrap();

    let before = engine
        .query("How much did I spend on Food in 2025-06?", None, Some(100))
        .unwrap();
    assert_eq!(total(&before), Decimal::from_str("59.87").unwrap());

    let replacement_csv = r#"Date,Amount,Where?,What?,Category,Source
"Mon, 02 Jun 2025",$1.00,Kiosk,Snack,Food,Cash
"#;
    let new_rows = parse_csv(replacement_csv.as_bytes()).unwrap();
    db.replace_transactions("tiny.csv", "h2", &new_rows).unwrap();

    let after = engine
        .query("How much did I spend on Food in 2025-06?", None, Some(100))
        .unwrap();
    assert_eq!(total(&after), Decimal::from_str("1.00").unwrap());
    assert_eq!(after.evidence.len(), 1);
    // No row from the first dataset is visible
    assert!(after
        .evidence
        .iter()
        .all(|r| r.merchant.as_deref() == Some("Kiosk")));
}

#[test]
fn test_concurrent_queries_during_replace_see_consistent_totals() {
    use std::sync::Arc;
    use std::thread;

    let db = Database::in_memory().unwrap();
    let rows = parse_csv(june_csv().as_bytes()).unwrap();
    db.replace_transactions("june.csv", "h1", &rows).unwrap();

    let engine = Arc::new(QueryEngine::new(db.clone()));
    let old_total = Decimal::from_str("59.87").unwrap();
    let new_total = Decimal::from_str("1.00").unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for _ in 0..25 {
                    let response = engine
                        .query("How much did I spend on Food in 2025-06?", None, Some(100))
                        .unwrap();
                    let value = *response.numbers.get("total").unwrap();
                    // Either the full old dataset or the full new one
                    assert!(
                        value == old_total || value == new_total,
                        "observed mixed dataset: {}",
                        value
                    );
                    let evidence_sum: Decimal =
                        response.evidence.iter().map(|r| r.amount).sum();
                    assert_eq!(evidence_sum, value);
                }
            })
        })
        .collect();

    let replacement_csv = r#"Date,Amount,Where?,What?,Category,Source
"Mon, 02 Jun 2025",$1.00,Kiosk,Snack,Food,Cash
"#;
    let new_rows = parse_csv(replacement_csv.as_bytes()).unwrap();
    db.replace_transactions("tiny.csv", "h2", &new_rows).unwrap();

    for reader in readers {
        reader.join().unwrap();
    }
}
