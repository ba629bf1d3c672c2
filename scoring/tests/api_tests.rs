mod test_utils;

use std::sync::Arc;

use axum::http::StatusCode;
use common::test_helpers::{TestError, TestResult, test_utils as helpers};
use scoring::{
    executable_utils::IngestResponse,
    reports::{InMemoryReportLog, ReportLogError},
};
use serde_json::json;
use tower::ServiceExt;

use test_utils::{
    MockReportLog, corpus_record, create_test_app, empty_request, json_request,
    response_body_string,
};

fn report_body() -> serde_json::Value {
    json!({
        "name": "Asha Rao",
        "email": "asha@example.com",
        "phone": "+919876543210",
        "fraud_type": "Phishing",
        "description": "Received a fake KYC update link",
        "severity": "High"
    })
}

fn request_failed(e: std::convert::Infallible) -> TestError {
    TestError::generic(format!("Request failed: {}", e))
}

#[tokio::test]
async fn test_health_check() -> TestResult {
    let app = create_test_app(Arc::new(InMemoryReportLog::new()), Vec::new());

    let response = app
        .oneshot(empty_request("GET", "/health")?)
        .await
        .map_err(request_failed)?;

    helpers::check_status_code(response.status(), StatusCode::OK)?;
    assert_eq!(response_body_string(response).await, "OK");
    Ok(())
}

#[tokio::test]
async fn test_analyze_known_phone() -> TestResult {
    let app = create_test_app(Arc::new(InMemoryReportLog::new()), Vec::new());

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/analyze",
            &json!({ "query": "+919999111111" }),
        )?)
        .await
        .map_err(request_failed)?;

    helpers::check_status_code(response.status(), StatusCode::OK)?;
    let body = helpers::parse_json(&response_body_string(response).await)?;
    assert_eq!(body["kind"], "phone_number");
    assert_eq!(body["phone_check"]["normalized"], "+919999111111");
    assert_eq!(body["phone_check"]["verdict"]["level"], "High");
    assert_eq!(body["known_fraud"]["reports"], 23);
    assert!(body["assessment"]["risk_score"].is_number());
    Ok(())
}

#[tokio::test]
async fn test_analyze_counts_corpus_matches() -> TestResult {
    let app = create_test_app(
        Arc::new(InMemoryReportLog::new()),
        vec![corpus_record("Clone Website: www.fakebank.com")],
    );

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/analyze",
            &json!({ "query": "fakebank", "kind": "url" }),
        )?)
        .await
        .map_err(request_failed)?;

    let body = helpers::parse_json(&response_body_string(response).await)?;
    assert_eq!(body["kind"], "url");
    assert_eq!(body["assessment"]["web_matches"], 1);
    assert_eq!(
        body["assessment"]["matches"][0]["value"],
        "Clone Website: www.fakebank.com"
    );
    Ok(())
}

#[tokio::test]
async fn test_phone_check() -> TestResult {
    let app = create_test_app(Arc::new(InMemoryReportLog::new()), Vec::new());

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/phone/check",
            &json!({ "phone": "654 321 1111" }),
        )?)
        .await
        .map_err(request_failed)?;
    let body = helpers::parse_json(&response_body_string(response).await)?;
    assert_eq!(body["normalized"], "+916543211111");
    assert_eq!(body["verdict"]["level"], "High");
    assert_eq!(body["verdict"]["source"], "Telecom Database");

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/phone/check",
            &json!({ "phone": "12345" }),
        )?)
        .await
        .map_err(request_failed)?;
    let body = helpers::parse_json(&response_body_string(response).await)?;
    assert!(body["normalized"].is_null());
    assert!(body["verdict"].is_null());
    Ok(())
}

#[tokio::test]
async fn test_submit_and_list_reports() -> TestResult {
    let app = create_test_app(Arc::new(InMemoryReportLog::new()), Vec::new());

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/reports", &report_body())?)
        .await
        .map_err(request_failed)?;
    helpers::check_status_code(response.status(), StatusCode::OK)?;
    let receipt = helpers::parse_json(&response_body_string(response).await)?;
    assert_eq!(receipt["status"], "success");
    let report_id = receipt["report_id"].as_str().unwrap_or_default().to_string();
    assert!(report_id.starts_with("HS"));

    let response = app
        .oneshot(empty_request("GET", "/api/reports")?)
        .await
        .map_err(request_failed)?;
    let reports = helpers::parse_json(&response_body_string(response).await)?;
    assert_eq!(reports.as_array().map(Vec::len), Some(1));
    assert_eq!(reports[0]["report_id"], report_id.as_str());
    assert_eq!(reports[0]["fraud_type"], "Phishing");
    Ok(())
}

#[tokio::test]
async fn test_invalid_report_is_unprocessable() -> TestResult {
    let mut log = MockReportLog::new();
    log.expect_append().times(0);
    let app = create_test_app(Arc::new(log), Vec::new());

    let mut body = report_body();
    body["name"] = json!("");
    let response = app
        .oneshot(json_request("POST", "/api/reports", &body)?)
        .await
        .map_err(request_failed)?;

    helpers::check_status_code(response.status(), StatusCode::UNPROCESSABLE_ENTITY)?;
    let receipt = helpers::parse_json(&response_body_string(response).await)?;
    assert_eq!(receipt["status"], "error");
    assert_eq!(receipt["message"], "missing required fields: name");
    Ok(())
}

#[tokio::test]
async fn test_report_storage_failure() -> TestResult {
    let mut log = MockReportLog::new();
    log.expect_append().returning(|_| {
        Err(ReportLogError::Io(std::io::Error::other("disk full")))
    });
    let app = create_test_app(Arc::new(log), Vec::new());

    let response = app
        .oneshot(json_request("POST", "/api/reports", &report_body())?)
        .await
        .map_err(request_failed)?;

    helpers::check_status_code(response.status(), StatusCode::INTERNAL_SERVER_ERROR)?;
    let receipt = helpers::parse_json(&response_body_string(response).await)?;
    assert_eq!(receipt["status"], "error");
    Ok(())
}

#[tokio::test]
async fn test_malformed_json_is_rejected() -> TestResult {
    let app = create_test_app(Arc::new(InMemoryReportLog::new()), Vec::new());

    let request = helpers::build_request("POST", "/api/analyze", Some("{invalid json}".to_string()))?;
    let (parts, body) = request.into_parts();
    let response = app
        .oneshot(http::Request::from_parts(parts, axum::body::Body::from(body)))
        .await
        .map_err(request_failed)?;

    helpers::check_status_code(response.status(), StatusCode::BAD_REQUEST)
}

#[tokio::test]
async fn test_corpus_ingest_feeds_analysis() -> TestResult {
    let app = create_test_app(
        Arc::new(InMemoryReportLog::new()),
        vec![corpus_record("Clone Website: www.fakebank.com")],
    );

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/corpus",
            &json!([{ "title": "Fake Lottery: lucky-draw.example" }]),
        )?)
        .await
        .map_err(request_failed)?;
    helpers::check_status_code(response.status(), StatusCode::OK)?;
    let ingested: IngestResponse = serde_json::from_str(&response_body_string(response).await)?;
    assert_eq!(ingested.added, 1);
    assert_eq!(ingested.total, 2);

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/api/corpus")?)
        .await
        .map_err(request_failed)?;
    let corpus = helpers::parse_json(&response_body_string(response).await)?;
    assert_eq!(corpus.as_array().map(Vec::len), Some(2));

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/analyze",
            &json!({ "query": "lucky-draw" }),
        )?)
        .await
        .map_err(request_failed)?;
    let body = helpers::parse_json(&response_body_string(response).await)?;
    assert_eq!(body["assessment"]["web_matches"], 1);
    Ok(())
}

#[tokio::test]
async fn test_report_missing_fraud_type_gets_receipt() -> TestResult {
    let mut log = MockReportLog::new();
    log.expect_append().times(0);
    let app = create_test_app(Arc::new(log), Vec::new());

    let body = json!({
        "name": "A",
        "email": "a@b.com",
        "description": "d",
        "severity": "High"
    });
    let response = app
        .oneshot(json_request("POST", "/api/reports", &body)?)
        .await
        .map_err(request_failed)?;

    helpers::check_status_code(response.status(), StatusCode::UNPROCESSABLE_ENTITY)?;
    let receipt = helpers::parse_json(&response_body_string(response).await)?;
    common::test_assert_eq!(receipt["status"], "error");
    common::test_assert!(receipt.get("report_id").is_none());
    common::test_assert!(
        receipt["message"]
            .as_str()
            .is_some_and(|message| message.contains("fraud_type")),
        "message should name the missing field: {}",
        receipt["message"]
    );
    Ok(())
}

#[tokio::test]
async fn test_unreadable_report_gets_receipt() -> TestResult {
    let app = create_test_app(Arc::new(InMemoryReportLog::new()), Vec::new());

    let request = helpers::build_request("POST", "/api/reports", Some("{invalid json}".to_string()))?;
    let (parts, body) = request.into_parts();
    let response = app
        .oneshot(http::Request::from_parts(parts, axum::body::Body::from(body)))
        .await
        .map_err(request_failed)?;

    helpers::check_status_code(response.status(), StatusCode::BAD_REQUEST)?;
    let receipt = helpers::parse_json(&response_body_string(response).await)?;
    common::test_assert_eq!(receipt["status"], "error");
    Ok(())
}
