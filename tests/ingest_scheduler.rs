// tests/ingest_scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use newsroom_ingest::ingest::config::SourceConfig;
use newsroom_ingest::ingest::scheduler::{spawn_ingest_scheduler, IngestSchedulerCfg};
use newsroom_ingest::ingest::types::{IngestContext, SourceType};
use newsroom_ingest::seo::HeuristicEnricher;
use newsroom_ingest::store::MemoryStore;

const TECH_XML: &str = include_str!("fixtures/tech_feed.xml");

#[tokio::test]
async fn scheduler_runs_a_cycle_on_its_first_tick() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TECH_XML))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::in_memory());
    let ctx = IngestContext {
        store: store.clone(),
        enricher: Arc::new(HeuristicEnricher),
    };
    let sources = vec![SourceConfig {
        name: "tech-desk".into(),
        kind: SourceType::Rss,
        url: Some(format!("{}/feed.xml", server.uri())),
        topic: None,
        max_items: None,
        timeout_secs: Some(5),
    }];

    let handle = spawn_ingest_scheduler(
        IngestSchedulerCfg { interval_secs: 3600 },
        sources,
        ctx,
    );

    // First tick fires immediately; give the run a moment to land.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if store.len().await == 3 {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "scheduler never committed the feed"
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    handle.abort();
}
