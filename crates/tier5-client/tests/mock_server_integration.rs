use std::time::Duration;

use serde_json::{json, Map};
use tier5_client::{ApiErrorKind, HttpReviewApi, ReviewApi};
use tier5_schema::{ChatRequest, DataStore, LabelRequest, StoreEntities};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_for(server: &MockServer) -> HttpReviewApi {
    HttpReviewApi::new(server.uri(), Some("alice".into()), Duration::from_secs(5))
}

fn label_request() -> LabelRequest {
    let mut corrected = Map::new();
    corrected.insert("title".into(), json!("Buy milk"));
    corrected.insert("intent".into(), json!("todo_list"));
    LabelRequest {
        prompt_id: "p1".into(),
        prompt_text: "add buy milk".into(),
        tool: "todo_list".into(),
        parser_intent: "todo_list".into(),
        reviewer_intent: "todo_list".into(),
        action: Some("create".into()),
        predicted_payload: Map::new(),
        corrected_payload: corrected,
        training_duplicate: None,
    }
}

#[tokio::test]
async fn pending_sends_paging_and_reviewer_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/logs/pending"))
        .and(query_param("limit", "25"))
        .and(query_param("page", "2"))
        .and(header("X-Reviewer-ID", "alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"prompt_id": "p1", "user_text": "add milk", "intent": "todo_list"},
                {"prompt_id": 42, "user_text": "weather in Oslo"}
            ],
            "summary": {"total": 2},
            "has_more": true,
            "page": 2,
            "limit": 25
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = api_for(&server).pending(2, 25).await.unwrap();
    assert_eq!(page.items.len(), 2);
    assert!(page.has_more);
    assert_eq!(page.page, 2);
}

#[tokio::test]
async fn data_store_decodes_collection_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/data/todos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "todos": [
                {"id": 7, "title": "Buy milk", "status": "pending"},
                {"id": "8", "title": "Call mom"}
            ]
        })))
        .mount(&server)
        .await;

    let entities = api_for(&server).data_store(DataStore::Todos).await.unwrap();
    match entities {
        StoreEntities::Todos(items) => {
            assert_eq!(items.len(), 2);
            assert_eq!(items[0].id, "7");
            assert_eq!(items[1].title, "Call mom");
        }
        other => panic!("unexpected store: {other:?}"),
    }
}

#[tokio::test]
async fn label_posts_body_and_reads_updated_stores() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/logs/label"))
        .and(header("X-Reviewer-ID", "alice"))
        .and(body_partial_json(json!({
            "prompt_id": "p1",
            "action": "create",
            "corrected_payload": {"title": "Buy milk", "intent": "todo_list"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "record": {"id": "c1", "prompt_id": "p1"},
            "updated_stores": ["todos"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = api_for(&server).label(&label_request()).await.unwrap();
    assert_eq!(response.updated_stores, vec!["todos".to_string()]);
    assert_eq!(response.record["id"], "c1");
}

#[tokio::test]
async fn unauthorized_is_classified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/intents"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Not authenticated"})))
        .mount(&server)
        .await;

    let err = api_for(&server).intents().await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.detail, "Not authenticated");
}

#[tokio::test]
async fn server_error_detail_from_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/logs/label"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "db locked"})))
        .mount(&server)
        .await;

    let err = api_for(&server).label(&label_request()).await.unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::Server);
    assert_eq!(err.detail, "db locked");
}

#[tokio::test]
async fn delete_pending_encodes_id() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/logs/pending/a%20b"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    api_for(&server).delete_pending("a b").await.unwrap();
}

#[tokio::test]
async fn delete_corrected_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/logs/corrected/c9"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "no such record"})))
        .mount(&server)
        .await;

    let err = api_for(&server).delete_corrected("c9").await.unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::NotFound);
    assert_eq!(err.detail, "no such record");
}

#[tokio::test]
async fn stats_carries_pending_sample() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pending": 3,
            "corrected": 10,
            "pending_sample": [{"prompt_id": "p9", "user_text": "hello"}]
        })))
        .mount(&server)
        .await;

    let stats = api_for(&server).stats().await.unwrap();
    assert_eq!(stats.pending_sample.len(), 1);
    assert_eq!(stats.counts.get("corrected"), Some(&json!(10)));
}

#[tokio::test]
async fn corrected_log_passes_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/logs/corrected"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "c1", "prompt_id": "p1", "reviewer_intent": "weather"}
        ])))
        .mount(&server)
        .await;

    let records = api_for(&server).corrected(100).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].reviewer_intent.as_deref(), Some("weather"));
}

#[tokio::test]
async fn cleared_reviewer_omits_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(header("X-Reviewer-ID", "alice"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reply": "hi"})))
        .mount(&server)
        .await;

    let api = api_for(&server);
    api.set_reviewer(None);
    let reply = api
        .chat(&ChatRequest {
            message: "hello".into(),
            conversation_entry_id: None,
        })
        .await
        .unwrap();
    assert_eq!(reply.reply, "hi");
}

#[tokio::test]
async fn unreachable_server_is_offline() {
    let api = HttpReviewApi::new("http://127.0.0.1:9", None, Duration::from_millis(500));
    let err = api.intents().await.unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::Offline);
}

#[tokio::test]
async fn malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/intents"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = api_for(&server).intents().await.unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::Decode);
}
