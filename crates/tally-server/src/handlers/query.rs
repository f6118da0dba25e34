//! Query handler

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::{AppError, AppState, MAX_EVIDENCE_LIMIT};
use tally_core::{Response, YearMonth};

/// Request body for POST /api/query
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    /// Explicit month, "YYYY-MM"; overrides any month in the question.
    pub month: Option<String>,
    /// Evidence row cap, 1..=100; defaults to the engine's configured limit.
    pub limit_evidence: Option<i64>,
}

/// POST /api/query - answer a question about the active dataset
pub async fn query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<Response>, AppError> {
    let month = request
        .month
        .as_deref()
        .map(str::parse::<YearMonth>)
        .transpose()
        .map_err(|e| AppError::bad_request(&e.to_string()))?;

    let limit = match request.limit_evidence {
        None => None,
        Some(l) if (1..=MAX_EVIDENCE_LIMIT).contains(&l) => Some(l),
        Some(_) => {
            return Err(AppError::bad_request(&format!(
                "limit_evidence must be between 1 and {}",
                MAX_EVIDENCE_LIMIT
            )))
        }
    };

    let response = state.engine.query(&request.question, month, limit)?;
    Ok(Json(response))
}
