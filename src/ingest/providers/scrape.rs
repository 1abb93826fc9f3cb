// src/ingest/providers/scrape.rs
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;
use tracing::warn;

use crate::ingest::config::SourceConfig;
use crate::ingest::types::{
    AdapterBatch, ArticleDraft, IngestContext, SourceAdapter, SourceType, DEFAULT_SOURCE_TIMEOUT,
};

/// What a scrape of one page resolved to. How the fetcher turns a URL into
/// this is its own business; the adapter only consumes the result.
#[derive(Debug, Clone)]
pub struct ScrapedPage {
    pub title: String,
    pub content_html: String,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub tags: BTreeSet<String>,
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<ScrapedPage>;

    fn name(&self) -> &'static str;
}

/// Plain HTTP fetcher: GET the page and lift title/body out of the raw HTML.
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent("newsroom-ingest/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpPageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, url: &str) -> Result<ScrapedPage> {
        let html = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("fetching page {url}"))?
            .error_for_status()
            .with_context(|| format!("page {url} answered with an error status"))?
            .text()
            .await
            .context("reading page body")?;

        static RE_TITLE: OnceCell<Regex> = OnceCell::new();
        let re_title =
            RE_TITLE.get_or_init(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());
        let title = re_title
            .captures(&html)
            .and_then(|c| c.get(1))
            .map(|m| crate::ingest::strip_html(m.as_str()))
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow!("page {url} has no <title>"))?;

        static RE_BODY: OnceCell<Regex> = OnceCell::new();
        let re_body =
            RE_BODY.get_or_init(|| Regex::new(r"(?is)<body[^>]*>(.*?)</body>").unwrap());
        let content_html = re_body
            .captures(&html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or(html);

        Ok(ScrapedPage {
            title,
            content_html,
            author: None,
            published_at: None,
            tags: BTreeSet::new(),
        })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Adapter over one scrape target. One invocation yields at most one
/// candidate; the page fetcher is an injected collaborator so tests and other
/// scraping backends slot in behind the same contract.
pub struct ScrapeAdapter {
    name: String,
    url: String,
    timeout: Duration,
    fetcher: Arc<dyn PageFetcher>,
}

impl ScrapeAdapter {
    pub fn new(name: &str, url: &str, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            timeout: DEFAULT_SOURCE_TIMEOUT,
            fetcher,
        }
    }

    pub fn from_config(cfg: &SourceConfig, fetcher: Arc<dyn PageFetcher>) -> Self {
        let mut adapter = Self::new(&cfg.name, cfg.url.as_deref().unwrap_or_default(), fetcher);
        adapter.timeout = cfg.timeout();
        adapter
    }
}

#[async_trait]
impl SourceAdapter for ScrapeAdapter {
    async fn fetch_candidates(&self, ctx: &IngestContext) -> Result<AdapterBatch> {
        let page = self.fetcher.fetch_page(&self.url).await?;

        let mut batch = AdapterBatch::default();
        let draft = ArticleDraft {
            title: page.title.clone(),
            content: page.content_html,
            author: page.author,
            tags: page.tags,
            source_type: SourceType::Scrape,
            source_url: Some(self.url.clone()),
            published_at: page.published_at,
            is_published: true,
        };

        match crate::ingest::assemble_candidate(ctx, draft).await {
            Ok(Some(candidate)) => batch.candidates.push(candidate),
            Ok(None) => batch.skipped += 1,
            Err(e) => {
                warn!(source = %self.name, item = %page.title, error = ?e, "scraped page failed; skipping");
                batch.item_errors.push(format!("'{}': {e:#}", page.title));
            }
        }

        Ok(batch)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}
