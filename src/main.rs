//! Ingestion Service — Binary Entrypoint
//! Boots the Axum HTTP server, the metrics recorder, and the background
//! ingestion scheduler over the configured sources.

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use newsroom_ingest::api::{self, AppState};
use newsroom_ingest::ingest::config::load_sources_default;
use newsroom_ingest::ingest::scheduler::{spawn_ingest_scheduler, IngestSchedulerCfg};
use newsroom_ingest::ingest::types::IngestContext;
use newsroom_ingest::metrics::{install_recorder, metrics_router};
use newsroom_ingest::seo::HeuristicEnricher;
use newsroom_ingest::store::MemoryStore;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ingest=info,newsroom_ingest=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let sources = match load_sources_default() {
        Ok(sources) => sources,
        Err(e) => {
            warn!(error = ?e, "failed to load sources config; starting with none");
            Vec::new()
        }
    };
    info!(sources = sources.len(), "sources configured");

    let store_path =
        std::env::var("ARTICLE_STORE_PATH").unwrap_or_else(|_| "data/articles.json".to_string());
    let ctx = IngestContext {
        store: Arc::new(MemoryStore::load_from(&store_path).await),
        enricher: Arc::new(HeuristicEnricher),
    };

    let interval_secs = env_u64("INGEST_INTERVAL_SECS", 300);
    let prometheus = install_recorder(interval_secs);
    spawn_ingest_scheduler(
        IngestSchedulerCfg { interval_secs },
        sources.clone(),
        ctx.clone(),
    );

    let state = AppState::new(ctx, sources);
    let app = api::create_router(state).merge(metrics_router(prometheus));

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
