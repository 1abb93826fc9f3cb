// src/store.rs
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::ingest::types::CandidateArticle;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A committed article. Created exactly once per logical article; the
/// ingestion pipeline never overwrites or re-inserts an existing one.
/// `view_count` belongs to the read path and only ever starts at zero here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredArticle {
    pub id: u64,
    pub view_count: u64,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub article: CandidateArticle,
}

/// Why `insert_many` refused one document. Duplicates are expected traffic and
/// are counted as skips by the orchestrator; the rest surface as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    DuplicateSlug,
    DuplicateSourceUrl,
    MissingTitle,
    MissingSlug,
}

impl RejectReason {
    pub fn is_duplicate(self) -> bool {
        matches!(self, Self::DuplicateSlug | Self::DuplicateSourceUrl)
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DuplicateSlug => "duplicate slug",
            Self::DuplicateSourceUrl => "duplicate source url",
            Self::MissingTitle => "missing title",
            Self::MissingSlug => "missing slug",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedDoc {
    pub slug: String,
    pub reason: RejectReason,
}

#[derive(Debug, Default)]
pub struct BulkInsertOutcome {
    pub inserted: usize,
    pub rejected: Vec<RejectedDoc>,
}

/// Narrow contract over the document store the pipeline commits into.
///
/// `insert_many` is the authoritative dedup boundary: unordered,
/// continue-on-error semantics, with slug and source-URL uniqueness enforced
/// per document, including against siblings inserted earlier in the same
/// call, which is what resolves same-batch slug races.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<StoredArticle>, StoreError>;

    async fn find_by_source_url(&self, url: &str) -> Result<Option<StoredArticle>, StoreError>;

    async fn find_by_content_hash(&self, hash: &str)
        -> Result<Option<StoredArticle>, StoreError>;

    /// All persisted slugs equal to `base` or of the form `base-N`.
    async fn find_slugs_matching(&self, base: &str) -> Result<Vec<String>, StoreError>;

    async fn insert_many(
        &self,
        candidates: Vec<CandidateArticle>,
    ) -> Result<BulkInsertOutcome, StoreError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    next_id: u64,
    // slug -> article
    articles: HashMap<String, StoredArticle>,
}

/// In-process article store with optional JSON file persistence. Suitable for
/// the standalone binary and tests; a production deployment swaps in a real
/// document store behind the same trait.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<StoreData>>,
    path: Option<PathBuf>,
}

impl MemoryStore {
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(RwLock::new(StoreData::default())),
            path: None,
        }
    }

    /// Load persisted articles from `path`, starting empty if the file is
    /// missing or unreadable.
    pub async fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let data = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<StoreData>(&bytes).unwrap_or_default(),
            Err(_) => StoreData::default(),
        };
        Self {
            inner: Arc::new(RwLock::new(data)),
            path: Some(path),
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.articles.len()
    }

    async fn persist(&self) -> Result<(), io::Error> {
        if let Some(path) = &self.path {
            let inner = self.inner.read().await;
            let bytes = serde_json::to_vec_pretty(&*inner)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            drop(inner);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            tokio::fs::write(path, bytes).await?;
        } else {
            debug!("article store is in-memory only; skipping persist");
        }
        Ok(())
    }
}

fn validate(candidate: &CandidateArticle, data: &StoreData) -> Option<RejectReason> {
    if candidate.title.trim().is_empty() {
        return Some(RejectReason::MissingTitle);
    }
    if candidate.slug.is_empty() {
        return Some(RejectReason::MissingSlug);
    }
    if data.articles.contains_key(&candidate.slug) {
        return Some(RejectReason::DuplicateSlug);
    }
    if let Some(url) = &candidate.source_url {
        let taken = data
            .articles
            .values()
            .any(|a| a.article.source_url.as_deref() == Some(url.as_str()));
        if taken {
            return Some(RejectReason::DuplicateSourceUrl);
        }
    }
    None
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<StoredArticle>, StoreError> {
        Ok(self.inner.read().await.articles.get(slug).cloned())
    }

    async fn find_by_source_url(&self, url: &str) -> Result<Option<StoredArticle>, StoreError> {
        let data = self.inner.read().await;
        Ok(data
            .articles
            .values()
            .find(|a| a.article.source_url.as_deref() == Some(url))
            .cloned())
    }

    async fn find_by_content_hash(
        &self,
        hash: &str,
    ) -> Result<Option<StoredArticle>, StoreError> {
        let data = self.inner.read().await;
        Ok(data
            .articles
            .values()
            .find(|a| a.article.content_hash == hash)
            .cloned())
    }

    async fn find_slugs_matching(&self, base: &str) -> Result<Vec<String>, StoreError> {
        let data = self.inner.read().await;
        let matches = data
            .articles
            .keys()
            .filter(|slug| {
                slug.as_str() == base
                    || slug
                        .strip_prefix(base)
                        .and_then(|rest| rest.strip_prefix('-'))
                        .is_some_and(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()))
            })
            .cloned()
            .collect();
        Ok(matches)
    }

    async fn insert_many(
        &self,
        candidates: Vec<CandidateArticle>,
    ) -> Result<BulkInsertOutcome, StoreError> {
        let mut outcome = BulkInsertOutcome::default();
        {
            let mut data = self.inner.write().await;
            for candidate in candidates {
                if let Some(reason) = validate(&candidate, &data) {
                    outcome.rejected.push(RejectedDoc {
                        slug: candidate.slug,
                        reason,
                    });
                    continue;
                }
                data.next_id += 1;
                let stored = StoredArticle {
                    id: data.next_id,
                    view_count: 0,
                    created_at: Utc::now(),
                    article: candidate,
                };
                data.articles.insert(stored.article.slug.clone(), stored);
                outcome.inserted += 1;
            }
        }
        if let Err(err) = self.persist().await {
            warn!(%err, "failed to persist article store");
        }
        Ok(outcome)
    }
}
