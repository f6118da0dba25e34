//! Monthly summary handler

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::{AppError, AppState, MAX_TOP_K};
use tally_core::db::MonthlySummaryReport;
use tally_core::YearMonth;

#[derive(Debug, Deserialize)]
pub struct MonthlySummaryQuery {
    /// Month in YYYY-MM format (required)
    pub month: String,
    /// Number of top merchants to include (default 5, max 20)
    pub top_k: Option<i64>,
}

/// GET /api/summary/monthly - totals, breakdowns, and top merchants
pub async fn monthly_summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MonthlySummaryQuery>,
) -> Result<Json<MonthlySummaryReport>, AppError> {
    let month: YearMonth = params
        .month
        .parse()
        .map_err(|e: tally_core::Error| AppError::bad_request(&e.to_string()))?;

    let top_k = params.top_k.unwrap_or(5);
    if !(1..=MAX_TOP_K).contains(&top_k) {
        return Err(AppError::bad_request(&format!(
            "top_k must be between 1 and {}",
            MAX_TOP_K
        )));
    }

    let report = state.db().monthly_summary_report(month, top_k)?;
    Ok(Json(report))
}
