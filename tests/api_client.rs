//! Companion API client tests against a mocked server.

use oracle::api::{ApiError, OracleApi};
use oracle::config::ApiConfig;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn api_for(server: &MockServer) -> OracleApi {
    OracleApi::new(&ApiConfig {
        base_url: format!("{}/", server.uri()),
        ..ApiConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_chat_posts_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/query"))
        .and(body_partial_json(json!({"message": "which agents are idle?"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "reply": "All agents are busy.",
            "context_used": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = api_for(&server).chat("which agents are idle?").await.unwrap();
    assert_eq!(response.reply, "All agents are busy.");
    assert!(response.context_used);
}

#[tokio::test]
async fn test_chat_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/query"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model offline"))
        .mount(&server)
        .await;

    let api = api_for(&server);
    match api.chat("hello").await {
        Err(ApiError::Upstream { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "model offline");
        }
        other => panic!("Expected upstream error, got {:?}", other),
    }
    assert!(api.chat_or_none("hello").await.is_none());
}

#[tokio::test]
async fn test_chat_unparseable_reply() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/query"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let result = api_for(&server).chat("hello").await;
    assert!(matches!(result, Err(ApiError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_create_task_sends_generated_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/tasks/"))
        .and(body_partial_json(json!({
            "description": "Summarise the backlog",
            "priority": "high"
        })))
        .respond_with(|request: &Request| {
            let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
            ResponseTemplate::new(200).set_body_json(json!({
                "status": "queued",
                "task_id": body["id"],
            }))
        })
        .expect(1)
        .mount(&server)
        .await;

    let created = api_for(&server)
        .create_task("Summarise the backlog", "high")
        .await
        .unwrap();
    assert_eq!(created.status, "queued");
    assert!(uuid::Uuid::parse_str(&created.task_id).is_ok());
}

#[tokio::test]
async fn test_download_report_uses_server_filename() {
    let server = MockServer::start().await;
    let pdf = b"%PDF-1.4 test".to_vec();

    Mock::given(method("GET"))
        .and(path("/reports/progress-report"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "content-disposition",
                    "attachment; filename=\"weekly.pdf\"",
                )
                .set_body_bytes(pdf.clone()),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let saved = api_for(&server).download_report(dir.path()).await.unwrap();

    assert_eq!(saved, dir.path().join("weekly.pdf"));
    assert_eq!(std::fs::read(&saved).unwrap(), pdf);
}

#[tokio::test]
async fn test_download_report_default_filename() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reports/progress-report"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF".to_vec()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let saved = api_for(&server).download_report(dir.path()).await.unwrap();
    let name = saved.file_name().unwrap().to_str().unwrap();

    assert!(name.starts_with("oracle_monitor_report_"));
    assert!(name.ends_with(".pdf"));
}

#[tokio::test]
async fn test_download_report_failure_writes_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reports/progress-report"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let api = api_for(&server);
    assert!(api.download_report_or_none(dir.path()).await.is_none());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
