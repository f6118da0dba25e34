//! Intent classification over extracted entities
//!
//! A fixed priority table, evaluated top-down, first match wins. Category
//! outranks merchant outranks source: when a question names several
//! dimensions at once, the most specific commonly-asked one decides. The
//! table is data so the ordering itself can be tested.

use super::entities::{Entities, EntityMatch};

/// What a question is asking for. Closed set; one per request.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Overall figures for one month.
    MonthlySummary,
    /// Spend total for one category.
    CategoryTotal(EntityMatch),
    /// Spend total at one merchant.
    MerchantTotal(EntityMatch),
    /// Spend total through one payment source.
    SourceTotal(EntityMatch),
    /// Nothing usable could be extracted.
    ClarificationNeeded,
}

impl Intent {
    /// Stable name used in traces.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MonthlySummary => "monthly_summary",
            Self::CategoryTotal(_) => "category_total",
            Self::MerchantTotal(_) => "merchant_total",
            Self::SourceTotal(_) => "source_total",
            Self::ClarificationNeeded => "clarification_needed",
        }
    }
}

/// One row of the priority table: if `build` returns an intent for the
/// extracted entities, that intent wins and evaluation stops.
pub struct IntentRule {
    pub name: &'static str,
    pub build: fn(&Entities) -> Option<Intent>,
}

/// The priority table. Order is the contract:
/// category > merchant > source > month-only.
pub static PRIORITY_RULES: &[IntentRule] = &[
    IntentRule {
        name: "category_total",
        build: |e| e.category.clone().map(Intent::CategoryTotal),
    },
    IntentRule {
        name: "merchant_total",
        build: |e| e.merchant.clone().map(Intent::MerchantTotal),
    },
    IntentRule {
        name: "source_total",
        build: |e| e.source.clone().map(Intent::SourceTotal),
    },
    IntentRule {
        name: "monthly_summary",
        build: |e| e.month.map(|_| Intent::MonthlySummary),
    },
];

/// Classify a question's entities; falls back to `ClarificationNeeded`.
pub fn resolve_intent(entities: &Entities) -> Intent {
    for rule in PRIORITY_RULES {
        if let Some(intent) = (rule.build)(entities) {
            return intent;
        }
    }
    Intent::ClarificationNeeded
}
