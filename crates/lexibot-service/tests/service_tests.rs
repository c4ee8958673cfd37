use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tempfile::TempDir;
use tower::ServiceExt;

use lexibot_core::error::Error;
use lexibot_core::traits::Embedder;
use lexibot_core::types::Chunk;
use lexibot_embed::{FakeEmbedder, EMBEDDING_DIM};
use lexibot_llm::FakeGenerator;
use lexibot_service::{router, AppState, AskResponse, QueryService};
use lexibot_vector::{ChunkIndexer, ChunkSearchEngine};

fn statute_chunks() -> Vec<Chunk> {
    vec![
        Chunk::new("Employees are entitled to annual leave.", "employment_act_1955"),
        Chunk::new("Overtime pay is regulated by Part XII.", "employment_act_1955"),
    ]
}

async fn build_service(dir: &TempDir, chunks: &[Chunk]) -> QueryService {
    let embedder = FakeEmbedder::new(EMBEDDING_DIM);
    let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
    let embeddings = embedder.embed_batch(&texts).expect("embed");

    let indexer = ChunkIndexer::new(dir.path(), "chunks").await.expect("indexer");
    indexer.index(chunks, &embeddings).await.expect("index");

    let engine = ChunkSearchEngine::open(dir.path(), "chunks").await.expect("open");
    QueryService::new(engine, Box::new(FakeEmbedder::new(EMBEDDING_DIM)), Box::new(FakeGenerator))
        .await
        .expect("service")
}

#[tokio::test]
async fn annual_leave_question_retrieves_the_leave_chunk_first() {
    let tmp = TempDir::new().unwrap();
    let service = build_service(&tmp, &statute_chunks()).await;

    let answer = service.ask("What about annual leave?", 1).await.expect("ask");
    assert_eq!(answer.context.len(), 1);
    assert_eq!(answer.context[0], "Employees are entitled to annual leave.");
    assert_eq!(answer.query, "What about annual leave?");
    assert!(!answer.answer.is_empty());
}

#[tokio::test]
async fn empty_query_is_rejected_before_any_model_work() {
    let tmp = TempDir::new().unwrap();
    let service = build_service(&tmp, &statute_chunks()).await;

    let err = service.ask("   ", 3).await.expect_err("empty query");
    assert!(matches!(err, Error::BadRequest(_)));
}

#[tokio::test]
async fn zero_top_k_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let service = build_service(&tmp, &statute_chunks()).await;

    let err = service.ask("What about annual leave?", 0).await.expect_err("top_k=0");
    assert!(matches!(err, Error::BadRequest(_)));
}

#[tokio::test]
async fn top_k_is_clamped_to_the_index_size() {
    let tmp = TempDir::new().unwrap();
    let service = build_service(&tmp, &statute_chunks()).await;

    assert_eq!(service.index_size(), 2);
    let answer = service.ask("overtime pay rules", 10).await.expect("ask");
    assert_eq!(answer.context.len(), 2, "top_k=10 against 2 chunks returns 2");
}

#[tokio::test]
async fn context_length_never_exceeds_requested_top_k() {
    let tmp = TempDir::new().unwrap();
    let service = build_service(&tmp, &statute_chunks()).await;

    let answer = service.ask("overtime pay rules", 1).await.expect("ask");
    assert_eq!(answer.context.len(), 1);
}

#[tokio::test]
async fn generation_failure_surfaces_as_a_generation_error() {
    struct FailingGenerator;
    impl lexibot_core::traits::Generator for FailingGenerator {
        fn generate(&self, _: &str, _: usize, _: &[String]) -> anyhow::Result<String> {
            anyhow::bail!("out of memory")
        }
    }

    let tmp = TempDir::new().unwrap();
    let chunks = statute_chunks();
    let embedder = FakeEmbedder::new(EMBEDDING_DIM);
    let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
    let embeddings = embedder.embed_batch(&texts).expect("embed");
    let indexer = ChunkIndexer::new(tmp.path(), "chunks").await.expect("indexer");
    indexer.index(&chunks, &embeddings).await.expect("index");
    let engine = ChunkSearchEngine::open(tmp.path(), "chunks").await.expect("open");

    let service = QueryService::new(
        engine,
        Box::new(FakeEmbedder::new(EMBEDDING_DIM)),
        Box::new(FailingGenerator),
    )
    .await
    .expect("service");

    let err = service.ask("What about annual leave?", 3).await.expect_err("generation fails");
    assert!(matches!(err, Error::Generation(_)));
}

// --- HTTP layer ---

async fn post_ask(app: axum::Router, body: serde_json::Value) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/ask")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn post_ask_round_trip() {
    let tmp = TempDir::new().unwrap();
    let service = build_service(&tmp, &statute_chunks()).await;
    let app = router(AppState { service: Arc::new(service) });

    let (status, body) = post_ask(
        app,
        serde_json::json!({ "query": "What about annual leave?", "top_k": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let response: AskResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(response.query, "What about annual leave?");
    assert_eq!(response.context, vec!["Employees are entitled to annual leave.".to_string()]);
    assert!(!response.answer.is_empty());
}

#[tokio::test]
async fn top_k_defaults_to_three_when_omitted() {
    let tmp = TempDir::new().unwrap();
    let service = build_service(&tmp, &statute_chunks()).await;
    let app = router(AppState { service: Arc::new(service) });

    let (status, body) = post_ask(app, serde_json::json!({ "query": "overtime pay" })).await;
    assert_eq!(status, StatusCode::OK);
    let response: AskResponse = serde_json::from_slice(&body).unwrap();
    // Default 3, clamped to the 2 indexed chunks.
    assert_eq!(response.context.len(), 2);
}

#[tokio::test]
async fn non_positive_top_k_gets_a_client_error() {
    let tmp = TempDir::new().unwrap();
    let service = build_service(&tmp, &statute_chunks()).await;
    let app = router(AppState { service: Arc::new(service) });

    let (status, _) = post_ask(
        app.clone(),
        serde_json::json!({ "query": "annual leave", "top_k": 0 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) =
        post_ask(app, serde_json::json!({ "query": "annual leave", "top_k": -4 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_query_gets_a_client_error() {
    let tmp = TempDir::new().unwrap();
    let service = build_service(&tmp, &statute_chunks()).await;
    let app = router(AppState { service: Arc::new(service) });

    let (status, body) = post_ask(app, serde_json::json!({ "query": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let err: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(err["error"].as_str().unwrap().contains("query"));
}
