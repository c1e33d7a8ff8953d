// Import common test utilities
mod common;

use api::{
    models::{ErrorResponse, SearchResponse},
    routes::health::HealthResponse,
};
use common::*;
use axum::http::{HeaderName, HeaderValue};
use httpmock::prelude::*;
use serde_json::json;

#[tokio::test]
async fn test_search_returns_results_in_provider_order() {
    let serper = MockServer::start_async().await;
    let mock = serper
        .mock_async(|when, then| {
            when.method(POST)
                .path("/search")
                .header("X-API-KEY", TEST_SERPER_KEY)
                .body_contains("husleie depositum")
                .body_contains("site:lovdata.no");
            then.status(200).json_body(json!({
                "organic": [
                    {"title": "Husleieloven § 3-5", "link": "https://lovdata.no/lov/1999-03-26-17/§3-5", "snippet": "Depositum"},
                    {"title": "Husleietvistutvalget", "link": "https://www.domstol.no/htu", "snippet": "Tvister"},
                    {"title": "Uten utdrag", "link": "https://regjeringen.no/x"}
                ]
            }));
        })
        .await;
    let server = setup_search_server(&serper_config(serper.base_url(), Some(TEST_SERPER_KEY)));

    let response = server
        .post("/api/search")
        .json(&json!({"query": "  husleie depositum  "}))
        .await;

    mock.assert_async().await;
    assert_eq!(response.status_code(), 200);
    let body: SearchResponse = response.json();
    let titles: Vec<_> = body.results.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["Husleieloven § 3-5", "Husleietvistutvalget", "Uten utdrag"]
    );
    assert_eq!(body.results[2].snippet, "");
}

#[tokio::test]
async fn test_search_without_credential_returns_empty_list() {
    let serper = MockServer::start_async().await;
    let mock = serper
        .mock_async(|when, then| {
            when.method(POST).path("/search");
            then.status(200).json_body(json!({"organic": []}));
        })
        .await;
    let server = setup_search_server(&serper_config(serper.base_url(), None));

    let response = server
        .post("/api/search")
        .json(&json!({"query": "arveloven pliktdel"}))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: SearchResponse = response.json();
    assert!(body.results.is_empty());
    mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_search_provider_failure_is_reported() {
    let serper = MockServer::start_async().await;
    serper
        .mock_async(|when, then| {
            when.method(POST).path("/search");
            then.status(403).body("Unauthorized.");
        })
        .await;
    let server = setup_search_server(&serper_config(serper.base_url(), Some(TEST_SERPER_KEY)));

    let response = server
        .post("/api/search")
        .json(&json!({"query": "foreldelsesloven"}))
        .await;

    assert_eq!(response.status_code(), 500);
    let error: ErrorResponse = response.json();
    assert_eq!(error.error.r#type, "search_error");
    assert!(error.error.message.contains("403"));
}

#[tokio::test]
async fn test_blank_or_missing_query_is_rejected() {
    let server = setup_search_server(&serper_config("http://127.0.0.1:9".to_string(), None));

    for body in [json!({"query": " "}), json!({})] {
        let response = server.post("/api/search").json(&body).await;
        assert_eq!(response.status_code(), 400);
        let error: ErrorResponse = response.json();
        assert_eq!(error.error.param.as_deref(), Some("query"));
    }
}

#[tokio::test]
async fn test_health_and_openapi_are_served() {
    let server = setup_unconfigured_server();

    let health = server.get("/health").await;
    assert_eq!(health.status_code(), 200);
    let body: HealthResponse = health.json();
    assert_eq!(body.status, "ok");

    let doc = server.get("/api/openapi.json").await;
    assert_eq!(doc.status_code(), 200);
    let doc: serde_json::Value = doc.json();
    assert!(doc["paths"]["/api/chat"]["post"].is_object());
    assert!(doc["paths"]["/api/search"]["post"].is_object());
    assert!(doc["paths"]["/api/chat/{thread_id}/messages"]["get"].is_object());
}

#[tokio::test]
async fn test_cors_exposes_thread_header() {
    let server = setup_unconfigured_server();

    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("origin"),
            HeaderValue::from_static("http://localhost:5173"),
        )
        .await;

    assert_eq!(response.header("access-control-allow-origin"), "*");
    assert!(response
        .header("access-control-expose-headers")
        .to_str()
        .unwrap()
        .contains("x-thread-id"));
}
