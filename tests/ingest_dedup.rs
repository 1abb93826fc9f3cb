// tests/ingest_dedup.rs
use std::collections::BTreeSet;

use chrono::Utc;

use newsroom_ingest::ingest::content_fingerprint;
use newsroom_ingest::ingest::types::{CandidateArticle, SourceType};
use newsroom_ingest::store::{ArticleStore, MemoryStore, RejectReason};

fn candidate(slug: &str, source_url: Option<&str>) -> CandidateArticle {
    CandidateArticle {
        title: format!("Title for {slug}"),
        slug: slug.to_string(),
        content: format!("<p>Body for {slug}</p>"),
        excerpt: "Body...".to_string(),
        cover_image: "/images/cover-placeholder.jpg".to_string(),
        author: "Unknown Author".to_string(),
        tags: BTreeSet::new(),
        source_type: SourceType::Rss,
        source_url: source_url.map(str::to_string),
        meta_description: String::new(),
        meta_keywords: BTreeSet::new(),
        seo_score: 50.0,
        content_hash: content_fingerprint(&format!("<p>Body for {slug}</p>")),
        published_at: Utc::now(),
        is_published: true,
    }
}

#[tokio::test]
async fn sibling_slug_collision_in_one_batch_rejects_the_second() {
    let store = MemoryStore::in_memory();
    let outcome = store
        .insert_many(vec![candidate("same-story", None), candidate("same-story", None)])
        .await
        .unwrap();

    assert_eq!(outcome.inserted, 1);
    assert_eq!(outcome.rejected.len(), 1);
    assert_eq!(outcome.rejected[0].reason, RejectReason::DuplicateSlug);
    assert!(outcome.rejected[0].reason.is_duplicate());
}

#[tokio::test]
async fn persisted_source_url_rejects_later_batches() {
    let store = MemoryStore::in_memory();
    store
        .insert_many(vec![candidate("first-run", Some("https://a.test/story"))])
        .await
        .unwrap();

    let outcome = store
        .insert_many(vec![candidate("second-run", Some("https://a.test/story"))])
        .await
        .unwrap();
    assert_eq!(outcome.inserted, 0);
    assert_eq!(outcome.rejected[0].reason, RejectReason::DuplicateSourceUrl);
}

#[tokio::test]
async fn missing_title_is_a_validation_rejection_not_a_duplicate() {
    let store = MemoryStore::in_memory();
    let mut bad = candidate("untitled", None);
    bad.title = "   ".to_string();

    let outcome = store
        .insert_many(vec![bad, candidate("fine", None)])
        .await
        .unwrap();
    assert_eq!(outcome.inserted, 1);
    assert_eq!(outcome.rejected[0].reason, RejectReason::MissingTitle);
    assert!(!outcome.rejected[0].reason.is_duplicate());
}
