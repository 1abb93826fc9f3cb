// src/ingest/mod.rs
pub mod config;
pub mod dedup;
pub mod providers;
pub mod scheduler;
pub mod types;

use std::time::Instant;

use anyhow::{bail, Context, Result};
use futures_util::future::join_all;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::seo::MetadataEnricher;
use crate::slug::{generate_unique_slug, slugify};
use crate::store::{ArticleStore, StoreError};
use types::{
    ArticleDraft, CandidateArticle, IngestContext, IngestReport, SourceAdapter, SourceError,
    DEFAULT_COVER_IMAGE, UNKNOWN_AUTHOR,
};

const EXCERPT_CHARS: usize = 150;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "ingest_candidates_total",
            "Candidates produced by source adapters."
        );
        describe_counter!(
            "ingest_imported_total",
            "Articles committed to the store by ingestion runs."
        );
        describe_counter!(
            "ingest_skipped_total",
            "Candidates dropped as duplicates (advisory probe or commit)."
        );
        describe_counter!(
            "ingest_source_errors_total",
            "Source-level fetch/parse/timeout failures."
        );
        describe_counter!("ingest_runs_total", "Completed ingestion runs.");
        describe_histogram!("ingest_parse_ms", "Source payload parse time in milliseconds.");
        describe_histogram!("ingest_fetch_ms", "Per-source fetch time in milliseconds.");
        describe_gauge!(
            "ingest_pipeline_last_run_ts",
            "Unix ts when the ingestion pipeline last ran."
        );
    });
}

/// Strip tags, decode entities, collapse whitespace.
pub fn strip_html(s: &str) -> String {
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    let untagged = re_tags.replace_all(s, "");

    let decoded = html_escape::decode_html_entities(untagged.as_ref()).to_string();

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&decoded, " ").trim().to_string()
}

/// First ~150 characters of the stripped body, ellipsis-suffixed.
/// Never longer than 153 characters.
pub fn excerpt(content: &str) -> String {
    let text = strip_html(content);
    let mut out: String = text.chars().take(EXCERPT_CHARS).collect();
    out.push_str("...");
    out
}

/// First embedded `<img src>` in the content, or the placeholder cover.
pub fn extract_cover_image(content: &str) -> String {
    static RE_IMG: OnceCell<regex::Regex> = OnceCell::new();
    let re_img = RE_IMG
        .get_or_init(|| regex::Regex::new(r#"(?is)<img[^>]*\bsrc\s*=\s*["']([^"']+)["']"#).unwrap());
    re_img
        .captures(content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| DEFAULT_COVER_IMAGE.to_string())
}

/// Fingerprint of the normalized body, used as a dedup signal that survives
/// markup and whitespace churn between feeds carrying the same story.
pub fn content_fingerprint(content: &str) -> String {
    let normalized = strip_html(content).to_lowercase();
    let digest = Sha256::digest(normalized.as_bytes());
    format!("{digest:x}")
}

/// Turn one draft into a committed-shape candidate: advisory dedup probe,
/// enrichment, unique slug, derived excerpt/cover/fingerprint.
///
/// `Ok(None)` means the advisory probe already knows this article (the item is
/// a skip, not an error). `Err` means this one item failed, in enrichment or a
/// store read, and its siblings should proceed.
pub async fn assemble_candidate(
    ctx: &IngestContext,
    draft: ArticleDraft,
) -> Result<Option<CandidateArticle>> {
    let title = draft.title.trim().to_string();
    if title.is_empty() {
        bail!("item has no title");
    }

    let base = slugify(&title);
    if dedup::is_known(ctx.store.as_ref(), &base, draft.source_url.as_deref()).await? {
        return Ok(None);
    }

    let seo = ctx
        .enricher
        .generate(&title, &draft.content)
        .await
        .with_context(|| format!("enriching '{title}'"))?;
    let slug = generate_unique_slug(ctx.store.as_ref(), &title).await?;

    let author = draft
        .author
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

    Ok(Some(CandidateArticle {
        excerpt: excerpt(&draft.content),
        cover_image: extract_cover_image(&draft.content),
        content_hash: content_fingerprint(&draft.content),
        meta_description: seo.meta_description,
        meta_keywords: seo.keywords,
        seo_score: seo.seo_score,
        published_at: draft.published_at.unwrap_or_else(chrono::Utc::now),
        title,
        slug,
        content: draft.content,
        author,
        tags: draft.tags,
        source_type: draft.source_type,
        source_url: draft.source_url,
        is_published: draft.is_published,
    }))
}

/// Run one full ingestion cycle over the given adapters.
///
/// Sources are fetched concurrently, each under its own timeout; no source can
/// fail or stall the others. Accepted candidates are flattened in source order
/// then item order and committed in one unordered bulk insert, where the
/// store's per-document uniqueness check is the final word on duplicates.
/// Every partial failure is folded into the returned report; only total store
/// unavailability at commit time shows up as the run-level error, and even
/// that comes back as a report, not a raised error.
pub async fn run_ingestion(
    adapters: &[Box<dyn SourceAdapter>],
    ctx: &IngestContext,
) -> IngestReport {
    ensure_metrics_described();

    let mut report = IngestReport::default();

    let fetches = adapters.iter().map(|adapter| async move {
        let t0 = Instant::now();
        let outcome = tokio::time::timeout(adapter.timeout(), adapter.fetch_candidates(ctx)).await;
        histogram!("ingest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        (adapter, outcome)
    });

    let mut batch: Vec<CandidateArticle> = Vec::new();
    for (adapter, outcome) in join_all(fetches).await {
        let name = adapter.name();
        match outcome {
            Err(_) => {
                warn!(source = name, timeout = ?adapter.timeout(), "source timed out");
                counter!("ingest_source_errors_total").increment(1);
                report.errors.push(SourceError {
                    source: name.to_string(),
                    message: format!("timed out after {:?}", adapter.timeout()),
                });
            }
            Ok(Err(e)) => {
                warn!(source = name, error = ?e, "source failed");
                counter!("ingest_source_errors_total").increment(1);
                report.errors.push(SourceError {
                    source: name.to_string(),
                    message: format!("{e:#}"),
                });
            }
            Ok(Ok(adapter_batch)) => {
                report.skipped += adapter_batch.skipped;
                for message in adapter_batch.item_errors {
                    report.errors.push(SourceError {
                        source: name.to_string(),
                        message,
                    });
                }
                batch.extend(adapter_batch.candidates);
            }
        }
    }

    counter!("ingest_candidates_total").increment(batch.len() as u64);
    gauge!("ingest_pipeline_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);

    // An empty batch is a successful run, not a failure.
    if batch.is_empty() {
        counter!("ingest_skipped_total").increment(report.skipped as u64);
        return report;
    }

    match ctx.store.insert_many(batch).await {
        Ok(outcome) => {
            report.imported = outcome.inserted;
            for rejected in outcome.rejected {
                if rejected.reason.is_duplicate() {
                    report.skipped += 1;
                } else {
                    report.errors.push(SourceError {
                        source: "store".to_string(),
                        message: format!("{}: {}", rejected.slug, rejected.reason),
                    });
                }
            }
        }
        Err(StoreError::Unavailable(msg)) => {
            warn!(error = %msg, "bulk insert failed; store unavailable");
            counter!("ingest_source_errors_total").increment(1);
            report.imported = 0;
            report.errors.push(SourceError {
                source: "store".to_string(),
                message: format!("store unavailable: {msg}"),
            });
        }
    }

    counter!("ingest_imported_total").increment(report.imported as u64);
    counter!("ingest_skipped_total").increment(report.skipped as u64);
    info!(
        imported = report.imported,
        skipped = report.skipped,
        errors = report.errors.len(),
        "ingestion run finished"
    );
    report
}
