// tests/api_http.rs
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::Request;
use tower::ServiceExt;

use newsroom_ingest::api::{create_router, AppState};
use newsroom_ingest::ingest::types::{IngestContext, IngestReport};
use newsroom_ingest::seo::HeuristicEnricher;
use newsroom_ingest::store::MemoryStore;

fn test_state() -> AppState {
    let ctx = IngestContext {
        store: Arc::new(MemoryStore::in_memory()),
        enricher: Arc::new(HeuristicEnricher),
    };
    AppState::new(ctx, Vec::new())
}

#[tokio::test]
async fn health_answers_ok() {
    let app = create_router(test_state());
    let resp = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(resp.status().is_success());
}

#[tokio::test]
async fn manual_trigger_returns_a_report_even_with_no_sources() {
    let app = create_router(test_state());
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/ingest/run")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(resp.status().is_success());

    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let report: IngestReport = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(report.imported, 0);
    assert!(report.errors.is_empty());
}

#[tokio::test]
async fn last_run_is_empty_until_a_run_happens() {
    let state = test_state();

    let resp = create_router(state.clone())
        .oneshot(
            Request::builder()
                .uri("/debug/last-run")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let before: Option<IngestReport> = serde_json::from_slice(&bytes).unwrap();
    assert!(before.is_none());

    let _ = create_router(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/ingest/run")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let resp = create_router(state)
        .oneshot(
            Request::builder()
                .uri("/debug/last-run")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let after: Option<IngestReport> = serde_json::from_slice(&bytes).unwrap();
    assert!(after.is_some());
}
