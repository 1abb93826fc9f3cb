// tests/scrape_and_ai_adapters.rs
use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use newsroom_ingest::ingest::providers::ai_gen::{AiGenerationAdapter, MockGenerator};
use newsroom_ingest::ingest::providers::scrape::{
    HttpPageFetcher, PageFetcher, ScrapeAdapter, ScrapedPage,
};
use newsroom_ingest::ingest::types::{IngestContext, SourceAdapter, SourceType};
use newsroom_ingest::seo::HeuristicEnricher;
use newsroom_ingest::store::{ArticleStore, MemoryStore};

fn ctx() -> IngestContext {
    IngestContext {
        store: Arc::new(MemoryStore::in_memory()),
        enricher: Arc::new(HeuristicEnricher),
    }
}

struct FixturePage;

#[async_trait]
impl PageFetcher for FixturePage {
    async fn fetch_page(&self, _url: &str) -> Result<ScrapedPage> {
        Ok(ScrapedPage {
            title: "Scraped Exclusive Report".to_string(),
            content_html: "<p>Lifted straight off the page.</p>".to_string(),
            author: Some("Field Reporter".to_string()),
            published_at: None,
            tags: BTreeSet::new(),
        })
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

struct BrokenPage;

#[async_trait]
impl PageFetcher for BrokenPage {
    async fn fetch_page(&self, url: &str) -> Result<ScrapedPage> {
        Err(anyhow!("no route to {url}"))
    }

    fn name(&self) -> &'static str {
        "broken"
    }
}

#[tokio::test]
async fn scrape_adapter_builds_a_published_candidate_with_source_url() {
    let ctx = ctx();
    let adapter = ScrapeAdapter::new(
        "exclusive",
        "https://page.test/exclusive",
        Arc::new(FixturePage),
    );

    let batch = adapter.fetch_candidates(&ctx).await.unwrap();
    assert_eq!(batch.candidates.len(), 1);
    let c = &batch.candidates[0];
    assert_eq!(c.source_type, SourceType::Scrape);
    assert_eq!(c.source_url.as_deref(), Some("https://page.test/exclusive"));
    assert_eq!(c.author, "Field Reporter");
    assert!(c.is_published);
}

#[tokio::test]
async fn scrape_adapter_skips_a_page_already_persisted_by_url() {
    let ctx = ctx();
    let adapter = ScrapeAdapter::new(
        "exclusive",
        "https://page.test/exclusive",
        Arc::new(FixturePage),
    );

    let first = adapter.fetch_candidates(&ctx).await.unwrap();
    ctx.store.insert_many(first.candidates).await.unwrap();

    let second = adapter.fetch_candidates(&ctx).await.unwrap();
    assert!(second.candidates.is_empty());
    assert_eq!(second.skipped, 1);
}

#[tokio::test]
async fn fetcher_failure_fails_the_scrape_source() {
    let adapter = ScrapeAdapter::new("exclusive", "https://page.test/x", Arc::new(BrokenPage));
    assert!(adapter.fetch_candidates(&ctx()).await.is_err());
}

#[tokio::test]
async fn http_page_fetcher_lifts_title_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/post"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><head><title>Page Title Here</title></head><body><p>Article body.</p></body></html>",
        ))
        .mount(&server)
        .await;

    let page = HttpPageFetcher::new()
        .fetch_page(&format!("{}/post", server.uri()))
        .await
        .unwrap();
    assert_eq!(page.title, "Page Title Here");
    assert!(page.content_html.contains("Article body."));
    assert!(!page.content_html.contains("<title>"));
}

#[tokio::test]
async fn generated_articles_land_unpublished_without_source_url() {
    let ctx = ctx();
    let generator = Arc::new(MockGenerator {
        title: "Daily AI Briefing".to_string(),
        content_html: "<p>Synthesized summary of the day.</p>".to_string(),
    });
    let adapter = AiGenerationAdapter::new("daily-brief", "tech news of the day", generator);

    let batch = adapter.fetch_candidates(&ctx).await.unwrap();
    assert_eq!(batch.candidates.len(), 1);
    let c = &batch.candidates[0];
    assert_eq!(c.source_type, SourceType::Ai);
    assert!(c.source_url.is_none());
    assert!(!c.is_published, "generated content needs review first");
    assert_eq!(c.slug, "daily-ai-briefing");
}

#[tokio::test]
async fn regenerated_title_is_skipped_as_duplicate_slug() {
    let ctx = ctx();
    let generator = Arc::new(MockGenerator {
        title: "Daily AI Briefing".to_string(),
        content_html: "<p>Synthesized summary of the day.</p>".to_string(),
    });
    let adapter = AiGenerationAdapter::new("daily-brief", "tech news of the day", generator);

    let first = adapter.fetch_candidates(&ctx).await.unwrap();
    ctx.store.insert_many(first.candidates).await.unwrap();

    let second = adapter.fetch_candidates(&ctx).await.unwrap();
    assert!(second.candidates.is_empty());
    assert_eq!(second.skipped, 1);
}
