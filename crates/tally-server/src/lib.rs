//! Tally Web Server
//!
//! Axum-based REST API over the query engine:
//! - `POST /api/query` - ask a question, get answer + evidence + trace
//! - `POST /api/ingest` - replace the dataset from a CSV upload
//! - `GET /api/ingests` - ingestion history
//! - `GET /api/summary/monthly` - fixed monthly report
//! - `GET /health` - liveness check
//!
//! The transport validates shapes (month format, evidence limits, upload
//! size) and maps store failures to 5xx; everything the engine resolves
//! itself (clarifications, zero answers) is a 200 payload.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use tally_core::{Database, EngineConfig, QueryEngine};

mod handlers;

#[cfg(test)]
mod tests;

/// Maximum CSV upload size (10 MB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Maximum evidence rows a caller may request
pub const MAX_EVIDENCE_LIMIT: i64 = 100;

/// Maximum `top_k` for the monthly summary report
pub const MAX_TOP_K: i64 = 20;

/// Shared application state
pub struct AppState {
    pub engine: QueryEngine,
}

impl AppState {
    pub fn db(&self) -> &Database {
        self.engine.db()
    }
}

/// Create the application router
pub fn create_router(db: Database) -> Router {
    create_router_with_config(db, EngineConfig::from_env())
}

/// Create the application router with an explicit engine configuration
/// (for testing)
pub fn create_router_with_config(db: Database, config: EngineConfig) -> Router {
    let state = Arc::new(AppState {
        engine: QueryEngine::with_config(db, config),
    });

    let api_routes = Router::new()
        .route("/query", post(handlers::query))
        .route("/ingest", post(handlers::ingest_csv))
        .route("/ingests", get(handlers::list_ingests))
        .route("/summary/monthly", get(handlers::monthly_summary))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the server
pub async fn serve(db: Database, host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_router(db);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}
