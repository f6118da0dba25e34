//! Metric dispatch: one intent, one metric function, validated slots
//!
//! A static table maps every computable intent to exactly one metric
//! function and the filter slots it requires. Missing or unknown slots
//! produce a clarification request instead of a guessed default; the
//! engine never fills in a value the user did not give it.

use crate::config::MonthPolicy;
use crate::db::TxnFilter;
use crate::models::TxnKind;
use crate::month::YearMonth;

use super::entities::{EntityMatch, MatchConfidence};
use super::intent::Intent;
use super::metrics::{self, MetricFn};

/// Filter slot names, for validation and clarification wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Month,
    Category,
    Merchant,
    Source,
}

impl Slot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Month => "month",
            Self::Category => "category",
            Self::Merchant => "merchant",
            Self::Source => "source",
        }
    }
}

/// Why dispatch refused to run a metric.
#[derive(Debug, Clone, PartialEq)]
pub enum ClarificationReason {
    /// A required slot has no value.
    MissingSlot(Slot),
    /// A named entity is not in the dataset vocabulary.
    UnknownEntity { slot: Slot, name: String },
    /// The question resolved to no computable intent at all.
    Unsupported,
}

/// A validated dispatch: the metric to run and the filter both the metric
/// and the evidence selector will use.
#[derive(Debug)]
pub struct Dispatch {
    pub metric_name: &'static str,
    pub metric: MetricFn,
    pub filter: TxnFilter,
}

/// One row of the dispatch table.
struct DispatchEntry {
    intent_name: &'static str,
    metric_name: &'static str,
    /// Slots that must be present before the metric may run.
    requires: &'static [Slot],
    /// Direction constraint baked into the filter (totals are expense-only).
    kind: Option<TxnKind>,
    metric: MetricFn,
}

static DISPATCH_TABLE: &[DispatchEntry] = &[
    DispatchEntry {
        intent_name: "monthly_summary",
        metric_name: "monthly_summary",
        requires: &[Slot::Month],
        kind: None,
        metric: metrics::monthly_summary,
    },
    DispatchEntry {
        intent_name: "category_total",
        metric_name: "category_total",
        requires: &[Slot::Month, Slot::Category],
        kind: Some(TxnKind::Expense),
        metric: metrics::category_total,
    },
    DispatchEntry {
        intent_name: "merchant_total",
        metric_name: "merchant_total",
        requires: &[Slot::Month, Slot::Merchant],
        kind: Some(TxnKind::Expense),
        metric: metrics::merchant_total,
    },
    DispatchEntry {
        intent_name: "source_total",
        metric_name: "source_total",
        requires: &[Slot::Month, Slot::Source],
        kind: Some(TxnKind::Expense),
        metric: metrics::source_total,
    },
];

/// Route an intent to its metric function, or explain what is missing.
///
/// `month` is the already-resolved month (explicit parameter wins over
/// extracted text upstream). Under [`MonthPolicy::AllTime`] a missing
/// month widens the filter instead of clarifying.
pub fn dispatch(
    intent: &Intent,
    month: Option<YearMonth>,
    policy: MonthPolicy,
) -> std::result::Result<Dispatch, ClarificationReason> {
    let (entry, entity): (&DispatchEntry, Option<&EntityMatch>) = match intent {
        Intent::ClarificationNeeded => return Err(ClarificationReason::Unsupported),
        Intent::MonthlySummary => (find_entry("monthly_summary"), None),
        Intent::CategoryTotal(m) => (find_entry("category_total"), Some(m)),
        Intent::MerchantTotal(m) => (find_entry("merchant_total"), Some(m)),
        Intent::SourceTotal(m) => (find_entry("source_total"), Some(m)),
    };

    // A harvested phrase that missed the vocabulary: asking beats guessing.
    if let Some(m) = entity {
        if m.confidence == MatchConfidence::Unknown {
            let slot = entity_slot(entry);
            return Err(ClarificationReason::UnknownEntity {
                slot,
                name: m.value.clone(),
            });
        }
    }

    let mut filter = TxnFilter::new().month(month).kind(entry.kind);
    if let Some(m) = entity {
        filter = match entity_slot(entry) {
            Slot::Category => filter.category(Some(m.value.clone())),
            Slot::Merchant => filter.merchant(Some(m.value.clone())),
            Slot::Source => filter.source(Some(m.value.clone())),
            Slot::Month => filter,
        };
    }

    for slot in entry.requires {
        let present = match slot {
            Slot::Month => filter.month.is_some() || policy == MonthPolicy::AllTime,
            Slot::Category => filter.category.is_some(),
            Slot::Merchant => filter.merchant.is_some(),
            Slot::Source => filter.source.is_some(),
        };
        if !present {
            return Err(ClarificationReason::MissingSlot(*slot));
        }
    }

    Ok(Dispatch {
        metric_name: entry.metric_name,
        metric: entry.metric,
        filter,
    })
}

fn find_entry(intent_name: &str) -> &'static DispatchEntry {
    DISPATCH_TABLE
        .iter()
        .find(|e| e.intent_name == intent_name)
        .expect("every computable intent has a dispatch entry")
}

fn entity_slot(entry: &DispatchEntry) -> Slot {
    match entry.intent_name {
        "category_total" => Slot::Category,
        "merchant_total" => Slot::Merchant,
        "source_total" => Slot::Source,
        _ => Slot::Month,
    }
}
