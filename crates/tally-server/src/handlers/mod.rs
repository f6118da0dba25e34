//! HTTP handlers

mod ingest;
mod query;
mod summary;

pub use ingest::{ingest_csv, list_ingests};
pub use query::query;
pub use summary::monthly_summary;

use axum::Json;

/// GET /health - liveness check
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "app": "tally"
    }))
}
