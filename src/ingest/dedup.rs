// src/ingest/dedup.rs
//! Advisory duplicate detection against persisted articles.
//!
//! These probes exist to spare enrichment calls and to keep obvious repeats
//! out of the batch; they are read-then-act and therefore racy across
//! concurrent runs. The authoritative dedup boundary is the per-document
//! uniqueness check inside `ArticleStore::insert_many`.

use crate::ingest::types::CandidateArticle;
use crate::store::{ArticleStore, StoreError};

/// Pre-enrichment probe used by adapters: does any persisted article already
/// claim this slug or this exact source URL?
pub async fn is_known(
    store: &dyn ArticleStore,
    slug: &str,
    source_url: Option<&str>,
) -> Result<bool, StoreError> {
    if store.find_by_slug(slug).await?.is_some() {
        return Ok(true);
    }
    if let Some(url) = source_url {
        if store.find_by_source_url(url).await?.is_some() {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Full advisory check for an assembled candidate: slug, source URL, or
/// content fingerprint already present.
pub async fn is_duplicate(
    store: &dyn ArticleStore,
    candidate: &CandidateArticle,
) -> Result<bool, StoreError> {
    if is_known(store, &candidate.slug, candidate.source_url.as_deref()).await? {
        return Ok(true);
    }
    Ok(store
        .find_by_content_hash(&candidate.content_hash)
        .await?
        .is_some())
}
