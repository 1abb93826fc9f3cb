// src/ingest/providers/rss.rs
use std::collections::BTreeSet;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::histogram;
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};
use tracing::warn;

use crate::ingest::config::SourceConfig;
use crate::ingest::types::{
    AdapterBatch, ArticleDraft, IngestContext, SourceAdapter, SourceType, DEFAULT_MAX_ITEMS,
    DEFAULT_SOURCE_TIMEOUT,
};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    // quick-xml's serde `Deserializer` (used by `from_str`) does not resolve
    // XML namespaces; it exposes elements by their prefix-stripped *local*
    // name. So `<dc:date>` arrives as `date`, `<content:encoded>` as
    // `encoded`, and `<dc:creator>` as `creator` — match on those.
    #[serde(rename = "date")]
    dc_date: Option<String>,
    description: Option<String>,
    #[serde(rename = "encoded")]
    content_encoded: Option<String>,
    content: Option<String>,
    #[serde(rename = "creator")]
    dc_creator: Option<String>,
    creator: Option<String>,
    author: Option<String>,
    #[serde(default)]
    category: Vec<String>,
}

fn parse_rfc2822_utc(ts: &str) -> Option<DateTime<Utc>> {
    OffsetDateTime::parse(ts, &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

fn parse_iso_utc(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Adapter over one RSS feed. Feed order is preserved (most feeds publish
/// most-recent-first) and at most `max_items` items are considered.
pub struct RssAdapter {
    name: String,
    max_items: usize,
    timeout: Duration,
    mode: Mode,
}

enum Mode {
    // Owned copy so tests can hand in decoded fixture strings.
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl RssAdapter {
    pub fn from_fixture(name: &str, xml: &str) -> Self {
        Self {
            name: name.to_string(),
            max_items: DEFAULT_MAX_ITEMS,
            timeout: DEFAULT_SOURCE_TIMEOUT,
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn from_url(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            max_items: DEFAULT_MAX_ITEMS,
            timeout: DEFAULT_SOURCE_TIMEOUT,
            mode: Mode::Http {
                url: url.to_string(),
                client: reqwest::Client::new(),
            },
        }
    }

    pub fn from_config(cfg: &SourceConfig) -> Self {
        let mut adapter = Self::from_url(&cfg.name, cfg.url.as_deref().unwrap_or_default());
        adapter.max_items = cfg.max_items();
        adapter.timeout = cfg.timeout();
        adapter
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    async fn fetch_body(&self) -> Result<String> {
        match &self.mode {
            Mode::Fixture(xml) => Ok(xml.clone()),
            Mode::Http { url, client } => {
                let resp = client
                    .get(url)
                    .send()
                    .await
                    .with_context(|| format!("fetching feed {url}"))?;
                resp.error_for_status()
                    .with_context(|| format!("feed {url} answered with an error status"))?
                    .text()
                    .await
                    .context("reading feed body")
            }
        }
    }
}

#[async_trait]
impl SourceAdapter for RssAdapter {
    async fn fetch_candidates(&self, ctx: &IngestContext) -> Result<AdapterBatch> {
        let body = self.fetch_body().await?;

        let t0 = std::time::Instant::now();
        let xml_clean = scrub_html_entities_for_xml(&body);
        let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;
        histogram!("ingest_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        let mut batch = AdapterBatch::default();
        for item in rss.channel.item.into_iter().take(self.max_items) {
            let title = item.title.unwrap_or_default();

            // Field resolution order for heterogeneous feeds: fullest content
            // first, explicit creator first, ISO date before RFC 2822.
            let content = item
                .content_encoded
                .or(item.content)
                .or(item.description)
                .unwrap_or_default();
            let author = item.dc_creator.or(item.creator).or(item.author);
            let published_at = item
                .dc_date
                .as_deref()
                .and_then(parse_iso_utc)
                .or_else(|| item.pub_date.as_deref().and_then(parse_rfc2822_utc));
            let tags: BTreeSet<String> = item
                .category
                .into_iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();

            let draft = ArticleDraft {
                title: title.clone(),
                content,
                author,
                tags,
                source_type: SourceType::Rss,
                source_url: item.link.clone(),
                published_at,
                is_published: true,
            };

            match crate::ingest::assemble_candidate(ctx, draft).await {
                Ok(Some(candidate)) => batch.candidates.push(candidate),
                Ok(None) => batch.skipped += 1,
                Err(e) => {
                    warn!(source = %self.name, item = %title, error = ?e, "item failed; skipping");
                    batch.item_errors.push(format!("'{title}': {e:#}"));
                }
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

/// Feeds in the wild embed HTML entities the XML parser chokes on.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc2822_dates_convert_to_utc() {
        let dt = parse_rfc2822_utc("Wed, 05 Feb 2025 10:30:00 +0200").unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-02-05T08:30:00+00:00");
        assert!(parse_rfc2822_utc("not a date").is_none());
    }

    #[test]
    fn iso_dates_parse() {
        let dt = parse_iso_utc("2025-02-05T08:30:00Z").unwrap();
        assert_eq!(dt.timestamp(), 1738744200);
        assert!(parse_iso_utc("Wed, 05 Feb 2025").is_none());
    }

    #[test]
    fn entity_scrub_keeps_xml_parseable() {
        let xml = "<title>A&nbsp;B &ndash; C</title>";
        assert_eq!(scrub_html_entities_for_xml(xml), "<title>A B - C</title>");
    }
}
