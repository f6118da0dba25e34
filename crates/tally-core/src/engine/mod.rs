//! The deterministic query pipeline
//!
//! One request runs straight through: entities → intent → dispatch →
//! {metric, evidence} → trace → response, or branches once into a
//! clarification. Both terminal states return a well-formed [`Response`];
//! only store-access failures surface as `Err`.
//!
//! The consistency contract lives here: dispatch builds a single
//! [`TxnFilter`], the metric computes under it, the evidence selector
//! reads under it, and the trace records it. Nothing between those steps
//! may modify the filter.

pub mod dispatch;
pub mod entities;
pub mod evidence;
pub mod intent;
pub mod metrics;
pub mod response;
pub mod trace;

use tracing::debug;

use crate::config::EngineConfig;
use crate::db::Database;
use crate::error::Result;
use crate::month::YearMonth;

pub use dispatch::{ClarificationReason, Dispatch, Slot};
pub use entities::{Entities, EntityMatch, MatchConfidence};
pub use evidence::EvidenceSet;
pub use intent::Intent;
pub use metrics::MetricResult;
pub use response::Response;
pub use trace::{Trace, TraceBuilder};

/// The query engine: a database handle plus configuration.
///
/// Stateless per request; concurrent queries share the store snapshot
/// with no coordination.
#[derive(Clone)]
pub struct QueryEngine {
    db: Database,
    config: EngineConfig,
}

impl QueryEngine {
    pub fn new(db: Database) -> Self {
        Self::with_config(db, EngineConfig::default())
    }

    pub fn with_config(db: Database, config: EngineConfig) -> Self {
        Self { db, config }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Answer a question about the active dataset.
    ///
    /// `explicit_month` always overrides a month found in the text.
    /// `limit_evidence` caps the evidence rows only; totals and counts
    /// always describe the full matching set.
    pub fn query(
        &self,
        question: &str,
        explicit_month: Option<YearMonth>,
        limit_evidence: Option<i64>,
    ) -> Result<Response> {
        let limit = limit_evidence.unwrap_or(self.config.default_evidence_limit);
        let mut trace = TraceBuilder::new();

        // One snapshot for the whole request: vocabulary, metric, and
        // evidence all describe the same dataset even if a replace
        // commits mid-request.
        let store = self.db.snapshot()?;
        let vocab = store.vocabulary()?;
        let mut resolved = entities::resolve(question, &vocab);

        let month = match (explicit_month, resolved.month) {
            (Some(m), _) => {
                trace.note("Month provided in request");
                Some(m)
            }
            (None, Some(m)) => {
                trace.note("Month extracted from question");
                Some(m)
            }
            (None, None) => None,
        };
        resolved.month = month;

        let intent = intent::resolve_intent(&resolved);
        trace.intent(intent.name());
        trace.month(month);
        debug!(intent = intent.name(), ?month, "Resolved question");

        trace.called("dispatch");
        let dispatched = match dispatch::dispatch(&intent, month, self.config.month_policy) {
            Ok(d) => d,
            Err(reason) => {
                if let ClarificationReason::UnknownEntity { slot, name } = &reason {
                    trace.note(format!("Unknown {} '{}'", slot.as_str(), name));
                }
                return Ok(response::clarification(&reason, &vocab, trace.finish(0)));
            }
        };

        if dispatched.filter.month.is_none() {
            trace.note("No month specified; answering across all time");
        }
        trace.month(dispatched.filter.month);
        trace.filters(&dispatched.filter);

        let metric = (dispatched.metric)(&store, &dispatched.filter)?;
        trace.called(dispatched.metric_name);

        let evidence =
            evidence::select_evidence(&store, &dispatched.filter, limit, metric.count)?;
        trace.called("select_evidence");

        let returned = evidence.rows.len() as i64;
        Ok(response::assemble(
            &intent,
            &metric,
            evidence,
            trace.finish(returned),
        ))
    }
}
