use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

use crate::ingest;
use crate::ingest::config::{load_sources_default, SourceConfig};
use crate::ingest::providers::build_adapters;
use crate::ingest::types::{IngestContext, IngestReport};

#[derive(Clone)]
pub struct AppState {
    ctx: IngestContext,
    sources: Arc<RwLock<Vec<SourceConfig>>>,
    last_report: Arc<RwLock<Option<IngestReport>>>,
}

impl AppState {
    pub fn new(ctx: IngestContext, sources: Vec<SourceConfig>) -> Self {
        Self {
            ctx,
            sources: Arc::new(RwLock::new(sources)),
            last_report: Arc::new(RwLock::new(None)),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/ingest/run", post(run_ingest))
        .route("/debug/last-run", get(debug_last_run))
        .route("/admin/reload-sources", get(admin_reload_sources))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Manual trigger: run one full ingestion cycle over the configured sources
/// and answer with the run summary. Partial failures come back inside the
/// report, never as an error status.
async fn run_ingest(State(state): State<AppState>) -> Json<IngestReport> {
    let sources = state.sources.read().await.clone();
    let adapters = build_adapters(&sources);
    let report = ingest::run_ingestion(&adapters, &state.ctx).await;

    *state.last_report.write().await = Some(report.clone());
    Json(report)
}

async fn debug_last_run(State(state): State<AppState>) -> Json<Option<IngestReport>> {
    Json(state.last_report.read().await.clone())
}

async fn admin_reload_sources(State(state): State<AppState>) -> String {
    match load_sources_default() {
        Ok(fresh) => {
            let n = fresh.len();
            *state.sources.write().await = fresh;
            format!("reloaded ({n} sources)")
        }
        Err(e) => format!("failed: {e:#}"),
    }
}
