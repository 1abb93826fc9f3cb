// src/seo.rs
//! SEO metadata enrichment: the contract the pipeline calls per candidate,
//! plus a deterministic local implementation used when no remote enrichment
//! service is wired in.

use std::collections::BTreeSet;

use anyhow::Result;
use async_trait::async_trait;

use crate::ingest::strip_html;

const MAX_DESCRIPTION_CHARS: usize = 160;
const MAX_KEYWORDS: usize = 10;

/// Words too generic to be worth a keyword slot.
const STOPWORDS: &[&str] = &[
    "about", "after", "against", "because", "could", "every", "first", "from", "have", "into",
    "more", "other", "their", "there", "these", "this", "that", "were", "what", "when", "where",
    "which", "will", "with", "would", "your",
];

#[derive(Debug, Clone, PartialEq)]
pub struct SeoMetadata {
    pub meta_description: String,
    pub keywords: BTreeSet<String>,
    pub seo_score: f32,
}

/// Derives SEO metadata from a title and body. May fail per call; the caller
/// skips that one candidate and keeps its siblings.
#[async_trait]
pub trait MetadataEnricher: Send + Sync {
    async fn generate(&self, title: &str, content: &str) -> Result<SeoMetadata>;

    fn name(&self) -> &'static str;
}

/// Local enricher: description from the stripped lead of the body, keywords
/// from the title, a coarse quality score from length and structure signals.
/// Deterministic, never fails.
#[derive(Debug, Clone, Default)]
pub struct HeuristicEnricher;

impl HeuristicEnricher {
    fn describe(content: &str) -> String {
        let text = strip_html(content);
        let mut out: String = text.chars().take(MAX_DESCRIPTION_CHARS).collect();
        if text.chars().count() > MAX_DESCRIPTION_CHARS {
            // Back off to the last full word.
            if let Some(cut) = out.rfind(' ') {
                out.truncate(cut);
            }
        }
        out.trim().to_string()
    }

    fn keywords(title: &str) -> BTreeSet<String> {
        title
            .split(|c: char| !c.is_alphanumeric())
            .map(str::to_lowercase)
            .filter(|w| w.len() >= 4 && !STOPWORDS.contains(&w.as_str()))
            .take(MAX_KEYWORDS)
            .collect()
    }

    fn score(title: &str, content: &str) -> f32 {
        let text = strip_html(content);
        let words = text.split_whitespace().count();

        let mut score = 40.0_f32;
        score += match words {
            0..=49 => 0.0,
            50..=299 => 15.0,
            300..=1499 => 30.0,
            _ => 25.0,
        };
        if content.contains("<img") {
            score += 10.0;
        }
        let title_len = title.chars().count();
        if (20..=70).contains(&title_len) {
            score += 10.0;
        }
        score.clamp(0.0, 100.0)
    }
}

#[async_trait]
impl MetadataEnricher for HeuristicEnricher {
    async fn generate(&self, title: &str, content: &str) -> Result<SeoMetadata> {
        Ok(SeoMetadata {
            meta_description: Self::describe(content),
            keywords: Self::keywords(title),
            seo_score: Self::score(title, content),
        })
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}
