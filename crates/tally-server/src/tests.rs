//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use tally_core::{parse_csv, Database};

const FIXTURE_CSV: &str = r#"Date,Amount,Where?,What?,Category,Source
"Sun, 01 Jun 2025",$6.15,Blue Bottle,Latte,Food,Amex
"Tue, 03 Jun 2025",$12.40,Corner Deli,Lunch,Food,Amex
"Sat, 07 Jun 2025",$41.32,Whole Foods,Groceries,Food,Checking
"Thu, 05 Jun 2025",$80.00,Shell,Gas,Transport,Checking
"Fri, 20 Jun 2025",-$500.00,Acme Payroll,Salary,Income,Checking
"#;

fn seeded_db() -> Database {
    let db = Database::in_memory().unwrap();
    let rows = parse_csv(FIXTURE_CSV.as_bytes()).unwrap();
    db.replace_transactions("fixture.csv", "fixture-hash", &rows)
        .unwrap();
    db
}

fn setup_test_app() -> Router {
    create_router_with_config(seeded_db(), EngineConfig::default())
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

// ========== Health ==========

#[tokio::test]
async fn test_health() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["status"], "ok");
}

// ========== Query API ==========

#[tokio::test]
async fn test_query_category_total() {
    let app = setup_test_app();

    let body = serde_json::json!({
        "question": "How much did I spend on Food in 2025-06?"
    });
    let response = app.oneshot(json_request("/api/query", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;

    assert_eq!(json["numbers"]["total"], "59.87");
    assert_eq!(json["numbers"]["count"], "3");
    assert_eq!(json["evidence"].as_array().unwrap().len(), 3);
    assert_eq!(json["trace"]["intent"], "category_total");
    assert_eq!(json["trace"]["resolved_month"], "2025-06");
    assert!(json["final_answer"].as_str().unwrap().contains("$59.87"));
    assert!(json["clarifying_question"].is_null());
}

#[tokio::test]
async fn test_query_explicit_month_parameter() {
    let app = setup_test_app();

    let body = serde_json::json!({
        "question": "How much did I spend on Food?",
        "month": "2025-06"
    });
    let response = app.oneshot(json_request("/api/query", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["numbers"]["total"], "59.87");
}

#[tokio::test]
async fn test_query_clarification_is_ok_response() {
    let app = setup_test_app();

    let body = serde_json::json!({ "question": "tell me things" });
    let response = app.oneshot(json_request("/api/query", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert!(json["final_answer"].is_null());
    assert!(json["clarifying_question"].is_string());
    assert_eq!(json["evidence"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_query_rejects_bad_month_format() {
    let app = setup_test_app();

    let body = serde_json::json!({
        "question": "How much did I spend on Food?",
        "month": "June 2025"
    });
    let response = app.oneshot(json_request("/api/query", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_query_rejects_out_of_range_limit() {
    let app = setup_test_app();

    for limit in [0, -3, 101] {
        let body = serde_json::json!({
            "question": "How much did I spend on Food in 2025-06?",
            "limit_evidence": limit
        });
        let response = app
            .clone()
            .oneshot(json_request("/api/query", body))
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "limit {} accepted",
            limit
        );
    }
}

// ========== Summary API ==========

#[tokio::test]
async fn test_monthly_summary() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/summary/monthly?month=2025-06&top_k=2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;

    assert_eq!(json["month"], "2025-06");
    assert_eq!(json["totals"]["expense_total"], "139.87");
    assert_eq!(json["totals"]["income_total"], "-500.00");
    assert_eq!(json["totals"]["transaction_count"], 5);

    let by_category = json["by_category"].as_array().unwrap();
    assert_eq!(by_category[0]["category"], "Transport");

    let top = json["top_merchants"].as_array().unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0]["merchant"], "Shell");
}

#[tokio::test]
async fn test_monthly_summary_rejects_bad_month() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/summary/monthly?month=2025-13")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Ingest API ==========

fn multipart_request(uri: &str, filename: &str, csv: &str) -> Request<Body> {
    let boundary = "tally-test-boundary";
    let body = format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {csv}\r\n\
         --{b}--\r\n",
        b = boundary,
        f = filename,
        csv = csv
    );

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_ingest_replaces_dataset() {
    let app = setup_test_app();

    let replacement = "Date,Amount,Where?,What?,Category,Source\n\
                       \"Mon, 07 Jul 2025\",$3.00,Kiosk,Snack,Food,Cash\n";
    let response = app
        .clone()
        .oneshot(multipart_request("/api/ingest", "july.csv", replacement))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["row_count"], 1);
    assert_eq!(json["date_range"]["min"], "2025-07-07");
    assert_eq!(json["categories_seen"][0], "Food");

    // The June data is gone
    let body = serde_json::json!({
        "question": "How much did I spend on Food in 2025-06?"
    });
    let response = app.oneshot(json_request("/api/query", body)).await.unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["numbers"]["total"], "0.00");
}

#[tokio::test]
async fn test_ingest_rejects_missing_columns_and_records_failure() {
    let app = setup_test_app();

    let bad = "Date,Amount\n\"Mon, 07 Jul 2025\",$3.00\n";
    let response = app
        .clone()
        .oneshot(multipart_request("/api/ingest", "bad.csv", bad))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("missing required columns"));

    // Failure shows up in ingest history; dataset untouched
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/ingests")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = get_body_json(response).await;
    let history = json.as_array().unwrap();
    assert_eq!(history[0]["status"], "failed");
    assert_eq!(history[0]["filename"], "bad.csv");

    let body = serde_json::json!({
        "question": "How much did I spend on Food in 2025-06?"
    });
    let response = app.oneshot(json_request("/api/query", body)).await.unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["numbers"]["total"], "59.87");
}
