//! Ingest handlers

use std::sync::Arc;

use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{AppError, AppState};
use tally_core::{file_fingerprint, parse_csv, IngestRecord};

/// Response body for POST /api/ingest
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub ingest_id: i64,
    pub row_count: i64,
    pub date_range: DateRange,
    pub categories_seen: Vec<String>,
    pub sources_seen: Vec<String>,
    pub notes: String,
}

#[derive(Debug, Serialize)]
pub struct DateRange {
    pub min: Option<NaiveDate>,
    pub max: Option<NaiveDate>,
}

/// POST /api/ingest - replace the active dataset from a CSV upload
///
/// Expects a multipart form with a `file` field. A parse failure is
/// recorded in the ingest history and returned as 400; the active
/// dataset is untouched in that case.
pub async fn ingest_csv(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<IngestResponse>, AppError> {
    let mut filename = "upload.csv".to_string();
    let mut content: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::bad_request("Malformed multipart upload"))?
    {
        if field.name() == Some("file") {
            if let Some(name) = field.file_name() {
                filename = name.to_string();
            }
            let bytes = field
                .bytes()
                .await
                .map_err(|_| AppError::bad_request("Failed to read uploaded file"))?;
            content = Some(bytes.to_vec());
        }
    }

    let content = content.ok_or_else(|| AppError::bad_request("Missing 'file' field"))?;
    let file_hash = file_fingerprint(&content);

    let rows = match parse_csv(content.as_slice()) {
        Ok(rows) => rows,
        Err(e) => {
            let message = e.to_string();
            warn!(filename, error = %message, "Ingest rejected");
            state
                .db()
                .record_failed_ingest(&filename, Some(&file_hash), 0, &message)?;
            return Err(AppError::bad_request(&message));
        }
    };

    let summary = state.db().replace_transactions(&filename, &file_hash, &rows)?;

    Ok(Json(IngestResponse {
        ingest_id: summary.ingest_id,
        row_count: summary.row_count,
        date_range: DateRange {
            min: summary.date_min,
            max: summary.date_max,
        },
        categories_seen: summary.categories_seen,
        sources_seen: summary.sources_seen,
        notes: "Sign convention: expenses are positive numbers, income/settlements are negative numbers."
            .to_string(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ListIngestsQuery {
    pub limit: Option<i64>,
}

/// GET /api/ingests - ingestion history, most recent first
pub async fn list_ingests(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListIngestsQuery>,
) -> Result<Json<Vec<IngestRecord>>, AppError> {
    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let records = state.db().list_ingests(limit)?;
    Ok(Json(records))
}
