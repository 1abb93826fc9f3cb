// src/ingest/types.rs
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::seo::MetadataEnricher;
use crate::store::ArticleStore;

/// Final fallback when no source field resolves to an author name.
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// Cover used when the content carries no embedded image.
pub const DEFAULT_COVER_IMAGE: &str = "/images/cover-placeholder.jpg";

/// Per-source item cap applied when the configuration does not override it.
pub const DEFAULT_MAX_ITEMS: usize = 5;

/// A source that has not answered within this window counts as failed.
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Rss,
    Scrape,
    Ai,
    Manual,
}

/// An in-flight article produced by a source adapter, not yet committed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateArticle {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub cover_image: String,
    pub author: String,
    pub tags: BTreeSet<String>,
    pub source_type: SourceType,
    pub source_url: Option<String>,
    pub meta_description: String,
    pub meta_keywords: BTreeSet<String>,
    pub seo_score: f32,
    pub content_hash: String,
    pub published_at: DateTime<Utc>,
    pub is_published: bool,
}

/// Raw material one adapter item resolves to before enrichment and slugging.
#[derive(Debug, Clone)]
pub struct ArticleDraft {
    pub title: String,
    pub content: String,
    pub author: Option<String>,
    pub tags: BTreeSet<String>,
    pub source_type: SourceType,
    pub source_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub is_published: bool,
}

/// What one adapter invocation yielded. `skipped` counts items dropped by the
/// advisory dedup probe; `item_errors` records items that failed enrichment or
/// assembly without failing the source as a whole.
#[derive(Debug, Default)]
pub struct AdapterBatch {
    pub candidates: Vec<CandidateArticle>,
    pub skipped: usize,
    pub item_errors: Vec<String>,
}

/// Shared collaborators handed to every adapter invocation. The store client
/// is constructed by the process bootstrap and injected here; adapters and the
/// orchestrator never reach for globals.
#[derive(Clone)]
pub struct IngestContext {
    pub store: Arc<dyn ArticleStore>,
    pub enricher: Arc<dyn MetadataEnricher>,
}

/// One configured origin of content.
///
/// Returns `Err` only for a source-level failure (unreachable, malformed
/// payload). Per-item trouble stays inside the batch: enrichment failures land
/// in `item_errors`, advisory dedup hits in `skipped`. Item order in
/// `candidates` matches the source's own order.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch_candidates(&self, ctx: &IngestContext) -> Result<AdapterBatch>;

    fn name(&self) -> &str;

    fn timeout(&self) -> Duration {
        DEFAULT_SOURCE_TIMEOUT
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceError {
    pub source: String,
    pub message: String,
}

/// Outcome summary of one ingestion run, returned to the trigger (scheduler or
/// admin action) instead of any raw error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IngestReport {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<SourceError>,
}
