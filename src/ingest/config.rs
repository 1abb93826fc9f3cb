// src/ingest/config.rs
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::ingest::types::{SourceType, DEFAULT_MAX_ITEMS, DEFAULT_SOURCE_TIMEOUT};

const ENV_PATH: &str = "INGEST_SOURCES_PATH";

/// One configured origin of content, as written in the sources file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceConfig {
    pub name: String,
    pub kind: SourceType,
    /// Feed or page URL; required for rss and scrape sources.
    #[serde(default)]
    pub url: Option<String>,
    /// Generation topic; required for ai sources.
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub max_items: Option<usize>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl SourceConfig {
    pub fn max_items(&self) -> usize {
        self.max_items.unwrap_or(DEFAULT_MAX_ITEMS)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SOURCE_TIMEOUT)
    }
}

/// Load sources from an explicit path. Supports TOML or JSON formats.
pub fn load_sources_from(path: &Path) -> Result<Vec<SourceConfig>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading sources from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_sources(&content, ext.as_str())
}

/// Load sources using env var + fallbacks:
/// 1) $INGEST_SOURCES_PATH
/// 2) config/ingest_sources.toml
/// 3) config/ingest_sources.json
pub fn load_sources_default() -> Result<Vec<SourceConfig>> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_sources_from(&pb);
        } else {
            return Err(anyhow!("INGEST_SOURCES_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/ingest_sources.toml");
    if toml_p.exists() {
        return load_sources_from(&toml_p);
    }
    let json_p = PathBuf::from("config/ingest_sources.json");
    if json_p.exists() {
        return load_sources_from(&json_p);
    }
    Ok(Vec::new())
}

fn parse_sources(s: &str, hint_ext: &str) -> Result<Vec<SourceConfig>> {
    let try_toml = hint_ext == "toml" || s.contains("[[sources]]");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return clean_list(v);
        }
    }
    if let Ok(v) = parse_json(s) {
        return clean_list(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return clean_list(v);
        }
    }
    Err(anyhow!("unsupported sources format"))
}

fn parse_toml(s: &str) -> Result<Vec<SourceConfig>> {
    #[derive(Deserialize)]
    struct TomlSources {
        sources: Vec<SourceConfig>,
    }
    let v: TomlSources = toml::from_str(s)?;
    Ok(v.sources)
}

fn parse_json(s: &str) -> Result<Vec<SourceConfig>> {
    let v: Vec<SourceConfig> = serde_json::from_str(s)?;
    Ok(v)
}

/// Trim names, drop unnamed entries and later duplicates, validate per kind.
fn clean_list(items: Vec<SourceConfig>) -> Result<Vec<SourceConfig>> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::with_capacity(items.len());
    for mut cfg in items {
        cfg.name = cfg.name.trim().to_string();
        if cfg.name.is_empty() || !seen.insert(cfg.name.clone()) {
            continue;
        }
        validate(&cfg)?;
        out.push(cfg);
    }
    Ok(out)
}

fn validate(cfg: &SourceConfig) -> Result<()> {
    match cfg.kind {
        SourceType::Rss | SourceType::Scrape => {
            if cfg.url.as_deref().map_or(true, |u| u.trim().is_empty()) {
                return Err(anyhow!("source '{}' needs a url", cfg.name));
            }
        }
        SourceType::Ai => {
            if cfg.topic.as_deref().map_or(true, |t| t.trim().is_empty()) {
                return Err(anyhow!("source '{}' needs a topic", cfg.name));
            }
        }
        SourceType::Manual => {
            return Err(anyhow!(
                "source '{}' is manual; manual articles have no adapter",
                cfg.name
            ));
        }
    }
    Ok(())
}
