//! Response assembly: templated wording over already-computed figures
//!
//! The assembler never computes a number. Every figure in `final_answer`
//! is formatted from the metric result; every clarification names the
//! exact information that was missing. A response carries exactly one of
//! `final_answer` / `clarifying_question`.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{EvidenceRow, Vocabulary};
use crate::money::format_amount;

use super::dispatch::{ClarificationReason, Slot};
use super::evidence::EvidenceSet;
use super::intent::Intent;
use super::metrics::MetricResult;
use super::trace::Trace;

/// The terminal result of one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub final_answer: Option<String>,
    pub clarifying_question: Option<String>,
    /// Named figures; BTreeMap keeps serialization byte-stable.
    pub numbers: BTreeMap<String, Decimal>,
    pub evidence: Vec<EvidenceRow>,
    pub trace: Trace,
}

/// Build the answered terminal state.
pub fn assemble(
    intent: &Intent,
    metric: &MetricResult,
    evidence: EvidenceSet,
    trace: Trace,
) -> Response {
    let final_answer = render_answer(intent, metric);

    Response {
        final_answer: Some(final_answer),
        clarifying_question: None,
        numbers: metric.numbers.clone(),
        evidence: evidence.rows,
        trace,
    }
}

/// Build the clarification terminal state.
pub fn clarification(reason: &ClarificationReason, vocab: &Vocabulary, trace: Trace) -> Response {
    Response {
        final_answer: None,
        clarifying_question: Some(render_clarification(reason, vocab)),
        numbers: BTreeMap::new(),
        evidence: Vec::new(),
        trace,
    }
}

fn render_answer(intent: &Intent, metric: &MetricResult) -> String {
    match intent {
        Intent::MonthlySummary => {
            let expense = metric
                .numbers
                .get("expense_total")
                .copied()
                .unwrap_or_default();
            match metric.filter.month {
                Some(month) => format!(
                    "In {}, you spent {} across {} transactions. Net total: {}.",
                    month,
                    format_amount(expense),
                    metric.count,
                    format_amount(metric.value)
                ),
                None => format!(
                    "Across all recorded months, you spent {} over {} transactions. Net total: {}.",
                    format_amount(expense),
                    metric.count,
                    format_amount(metric.value)
                ),
            }
        }
        Intent::CategoryTotal(m) => spend_sentence("on", &m.value, metric),
        Intent::MerchantTotal(m) => spend_sentence("at", &m.value, metric),
        Intent::SourceTotal(m) => spend_sentence("using", &m.value, metric),
        // Dispatch never routes this intent to a metric.
        Intent::ClarificationNeeded => String::new(),
    }
}

fn spend_sentence(preposition: &str, entity: &str, metric: &MetricResult) -> String {
    match metric.filter.month {
        Some(month) => format!(
            "You spent {} {} {} in {} across {} transactions.",
            format_amount(metric.value),
            preposition,
            entity,
            month,
            metric.count
        ),
        None => format!(
            "You spent {} {} {} across {} transactions (all time).",
            format_amount(metric.value),
            preposition,
            entity,
            metric.count
        ),
    }
}

fn render_clarification(reason: &ClarificationReason, vocab: &Vocabulary) -> String {
    match reason {
        ClarificationReason::MissingSlot(Slot::Month) => {
            "Please specify a month in YYYY-MM format (e.g., 2025-05).".to_string()
        }
        ClarificationReason::MissingSlot(Slot::Category) => match sample(&vocab.categories) {
            Some(examples) => format!("Which category are you interested in? (e.g., {})", examples),
            None => "Which category are you interested in?".to_string(),
        },
        ClarificationReason::MissingSlot(Slot::Merchant) => {
            "Which merchant or store are you asking about? (e.g., 'at Target' or \"Uber\")"
                .to_string()
        }
        ClarificationReason::MissingSlot(Slot::Source) => match sample(&vocab.sources) {
            Some(examples) => format!(
                "Which payment source do you mean? (e.g., {})",
                examples
            ),
            None => "Which payment source do you mean?".to_string(),
        },
        ClarificationReason::UnknownEntity { slot, name } => {
            let known = match slot {
                Slot::Category => &vocab.categories,
                Slot::Merchant => &vocab.merchants,
                Slot::Source => &vocab.sources,
                Slot::Month => &vocab.categories,
            };
            match sample(known) {
                Some(examples) => format!(
                    "I couldn't find the {} '{}' in your data. Known {}s include: {}.",
                    slot.as_str(),
                    name,
                    slot.as_str(),
                    examples
                ),
                None => format!(
                    "I couldn't find the {} '{}' in your data, and the dataset has no {} values yet.",
                    slot.as_str(),
                    name,
                    slot.as_str()
                ),
            }
        }
        ClarificationReason::Unsupported => {
            "I can answer monthly summaries and category, merchant, or source totals. \
             Try something like 'How much did I spend on Food in 2025-06?'"
                .to_string()
        }
    }
}

/// Up to three example values, comma-joined.
fn sample(values: &[String]) -> Option<String> {
    if values.is_empty() {
        return None;
    }
    Some(
        values
            .iter()
            .take(3)
            .cloned()
            .collect::<Vec<_>>()
            .join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::super::entities::{EntityMatch, MatchConfidence};
    use super::super::trace::TraceBuilder;
    use super::*;
    use crate::db::TxnFilter;
    use crate::month::YearMonth;
    use std::str::FromStr;

    fn month() -> Option<YearMonth> {
        Some("2025-06".parse().unwrap())
    }

    fn metric(value: &str, count: i64, filter_month: Option<YearMonth>) -> MetricResult {
        let value = Decimal::from_str(value).unwrap();
        let mut numbers = BTreeMap::new();
        numbers.insert("total".to_string(), value);
        numbers.insert("count".to_string(), Decimal::from(count));
        MetricResult {
            value,
            count,
            numbers,
            filter: TxnFilter::new().month(filter_month),
        }
    }

    #[test]
    fn test_category_answer_wording() {
        let intent = Intent::CategoryTotal(EntityMatch {
            value: "Food".to_string(),
            confidence: MatchConfidence::Exact,
        });
        let m = metric("59.87", 6, month());
        let resp = assemble(
            &intent,
            &m,
            EvidenceSet {
                rows: vec![],
                matched: 6,
            },
            TraceBuilder::new().finish(0),
        );

        assert_eq!(
            resp.final_answer.as_deref(),
            Some("You spent $59.87 on Food in 2025-06 across 6 transactions.")
        );
        assert!(resp.clarifying_question.is_none());
    }

    #[test]
    fn test_zero_match_is_an_answer_not_a_clarification() {
        let intent = Intent::CategoryTotal(EntityMatch {
            value: "Travel".to_string(),
            confidence: MatchConfidence::Exact,
        });
        let m = metric("0.00", 0, month());
        let resp = assemble(
            &intent,
            &m,
            EvidenceSet {
                rows: vec![],
                matched: 0,
            },
            TraceBuilder::new().finish(0),
        );

        assert_eq!(
            resp.final_answer.as_deref(),
            Some("You spent $0.00 on Travel in 2025-06 across 0 transactions.")
        );
        assert!(resp.clarifying_question.is_none());
    }

    #[test]
    fn test_clarification_names_month() {
        let resp = clarification(
            &ClarificationReason::MissingSlot(Slot::Month),
            &Vocabulary::default(),
            TraceBuilder::new().finish(0),
        );
        assert!(resp.final_answer.is_none());
        assert!(resp
            .clarifying_question
            .as_deref()
            .unwrap()
            .contains("YYYY-MM"));
        assert!(resp.numbers.is_empty());
        assert!(resp.evidence.is_empty());
    }

    #[test]
    fn test_unknown_entity_lists_known_names() {
        let vocab = Vocabulary {
            merchants: vec!["Blue Bottle".into(), "Uber".into()],
            ..Vocabulary::default()
        };
        let resp = clarification(
            &ClarificationReason::UnknownEntity {
                slot: Slot::Merchant,
                name: "Starbs".to_string(),
            },
            &vocab,
            TraceBuilder::new().finish(0),
        );
        let q = resp.clarifying_question.unwrap();
        assert!(q.contains("Starbs"));
        assert!(q.contains("Blue Bottle"));
    }
}
