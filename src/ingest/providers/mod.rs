// src/ingest/providers/mod.rs
pub mod ai_gen;
pub mod rss;
pub mod scrape;

use std::sync::Arc;

use crate::ingest::config::SourceConfig;
use crate::ingest::types::{SourceAdapter, SourceType};

/// Build one adapter per validated source config. Manual sources never reach
/// this point (config validation rejects them).
pub fn build_adapters(configs: &[SourceConfig]) -> Vec<Box<dyn SourceAdapter>> {
    configs
        .iter()
        .filter(|cfg| cfg.kind != SourceType::Manual)
        .map(|cfg| match cfg.kind {
            SourceType::Rss => {
                Box::new(rss::RssAdapter::from_config(cfg)) as Box<dyn SourceAdapter>
            }
            SourceType::Scrape => Box::new(scrape::ScrapeAdapter::from_config(
                cfg,
                Arc::new(scrape::HttpPageFetcher::new()),
            )) as Box<dyn SourceAdapter>,
            SourceType::Ai => Box::new(ai_gen::AiGenerationAdapter::from_config(
                cfg,
                Arc::new(ai_gen::OpenAiGenerator::new(None)),
            )) as Box<dyn SourceAdapter>,
            SourceType::Manual => unreachable!("filtered above"),
        })
        .collect()
}
