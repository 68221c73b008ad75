use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chat_engine::{
    ChunkRequest, ChunkResponse, EngineEvent, EngineHandle, FailureKind, IndexedItemsResponse,
    QueryClient, QueryError, QueryRequest, QueryResponse, QuerySettings,
};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn next_event(engine: &EngineHandle) -> EngineEvent {
    for _ in 0..200 {
        if let Some(event) = engine.try_recv() {
            return event;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("no engine event within 2s");
}

#[tokio::test]
async fn engine_reports_each_cycle_by_id_even_out_of_order() {
    chat_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(body_json(json!({ "query": "slow" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(300))
                .set_body_json(json!({ "answer": "slow answer", "sources": [] })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(body_json(json!({ "query": "fast" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "answer": "fast answer" })),
        )
        .mount(&server)
        .await;

    let engine = EngineHandle::new(QuerySettings {
        base_url: server.uri(),
        ..QuerySettings::default()
    })
    .expect("engine");
    engine.query(1, "slow");
    engine.query(2, "fast");

    let mut order = Vec::new();
    let mut answers = BTreeMap::new();
    for _ in 0..2 {
        match next_event(&engine).await {
            EngineEvent::QueryCompleted { cycle_id, result } => {
                order.push(cycle_id);
                answers.insert(cycle_id, result.expect("answer").answer_text().to_string());
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    assert_eq!(order, vec![2, 1]);
    assert_eq!(answers[&1], "slow answer");
    assert_eq!(answers[&2], "fast answer");
}

#[tokio::test]
async fn engine_reports_chunk_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/database/retrieve_chunk"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "page_content": "text" })),
        )
        .mount(&server)
        .await;

    let engine = EngineHandle::new(QuerySettings {
        base_url: server.uri(),
        ..QuerySettings::default()
    })
    .unwrap();
    engine.retrieve_chunk("doc:0");

    match next_event(&engine).await {
        EngineEvent::ChunkCompleted { source_id, result } => {
            assert_eq!(source_id, "doc:0");
            assert_eq!(result.unwrap().page_content, "text");
        }
        other => panic!("unexpected event {other:?}"),
    }
}

struct FailingClient;

#[async_trait::async_trait]
impl QueryClient for FailingClient {
    async fn query(&self, _request: &QueryRequest) -> Result<QueryResponse, QueryError> {
        Err(QueryError {
            kind: FailureKind::Network,
            message: "connection reset".to_string(),
        })
    }

    async fn retrieve_chunk(&self, _request: &ChunkRequest) -> Result<ChunkResponse, QueryError> {
        Ok(ChunkResponse::default())
    }

    async fn list_indexed_items(&self) -> Result<IndexedItemsResponse, QueryError> {
        Err(QueryError {
            kind: FailureKind::MalformedResponse,
            message: "expected value".to_string(),
        })
    }
}

#[tokio::test]
async fn injected_client_failures_are_delivered_as_events() {
    let engine = EngineHandle::with_client(Arc::new(FailingClient)).unwrap();
    engine.query(9, "hello");

    match next_event(&engine).await {
        EngineEvent::QueryCompleted { cycle_id, result } => {
            assert_eq!(cycle_id, 9);
            assert_eq!(result.unwrap_err().kind, FailureKind::Network);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn index_listing_is_delivered_as_an_event() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/database/list_indexed_items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "n_items": 2,
            "ids": ["policy.pdf:0:0", "policy.pdf:1:0"]
        })))
        .mount(&server)
        .await;

    let engine = EngineHandle::new(QuerySettings {
        base_url: server.uri(),
        ..QuerySettings::default()
    })
    .expect("engine");
    engine.list_indexed_items();

    match next_event(&engine).await {
        EngineEvent::IndexListed { result } => {
            let listing = result.expect("listing");
            assert_eq!(listing.n_items, 2);
            assert_eq!(listing.ids, vec!["policy.pdf:0:0", "policy.pdf:1:0"]);
        }
        other => panic!("unexpected event {other:?}"),
    }

    let failing = EngineHandle::with_client(Arc::new(FailingClient)).unwrap();
    failing.list_indexed_items();
    match next_event(&failing).await {
        EngineEvent::IndexListed { result } => {
            assert_eq!(result.unwrap_err().kind, FailureKind::MalformedResponse);
        }
        other => panic!("unexpected event {other:?}"),
    }
}
