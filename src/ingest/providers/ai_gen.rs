// src/ingest/providers/ai_gen.rs
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ingest::config::SourceConfig;
use crate::ingest::types::{
    AdapterBatch, ArticleDraft, IngestContext, SourceAdapter, SourceType, DEFAULT_SOURCE_TIMEOUT,
};

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub topic: String,
    pub tags: BTreeSet<String>,
}

#[derive(Debug, Clone)]
pub struct GeneratedArticle {
    pub title: String,
    pub content_html: String,
    pub tags: BTreeSet<String>,
}

/// Produces one article draft for a topic. Prompting and model mechanics stay
/// behind this trait.
#[async_trait]
pub trait ArticleGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedArticle>;

    fn name(&self) -> &'static str;
}

/// Chat-completions-backed generator. Requires `OPENAI_API_KEY`.
pub struct OpenAiGenerator {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiGenerator {
    /// `model_override`: pass Some("gpt-4o-mini") to override; defaults to gpt-4o-mini.
    pub fn new(model_override: Option<&str>) -> Self {
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        let http = reqwest::Client::builder()
            .user_agent("newsroom-ingest/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        let model = model_override.unwrap_or("gpt-4o-mini").to_string();
        Self {
            http,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl ArticleGenerator for OpenAiGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedArticle> {
        if self.api_key.is_empty() {
            return Err(anyhow!("OPENAI_API_KEY is not set"));
        }

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: String,
        }

        let sys = "You write news articles in clean HTML. Start with exactly one <h1> holding the headline, then the body in <p> paragraphs. No scripts, no inline styles.";
        let user = format!("Write a short news article about: {}", request.topic);
        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: sys,
                },
                Msg {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: 0.7,
            max_tokens: 900,
        };

        let resp = self
            .http
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("calling generation api")?;
        let resp = resp
            .error_for_status()
            .context("generation api answered with an error status")?;
        let body: Resp = resp.json().await.context("decoding generation response")?;

        let html = body
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| anyhow!("generation api returned no content"))?;

        let (title, content_html) = split_headline(&html, &request.topic);
        Ok(GeneratedArticle {
            title,
            content_html,
            tags: request.tags.clone(),
        })
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Lift the `<h1>` headline out of generated HTML; fall back to the topic when
/// the model ignored the format.
fn split_headline(html: &str, fallback_title: &str) -> (String, String) {
    static RE_H1: OnceCell<Regex> = OnceCell::new();
    let re_h1 = RE_H1.get_or_init(|| Regex::new(r"(?is)<h1[^>]*>(.*?)</h1>").unwrap());
    match re_h1.captures(html) {
        Some(caps) => {
            let title = crate::ingest::strip_html(caps.get(1).map_or("", |m| m.as_str()));
            let rest = re_h1.replace(html, "").trim().to_string();
            if title.is_empty() {
                (fallback_title.to_string(), rest)
            } else {
                (title, rest)
            }
        }
        None => (fallback_title.to_string(), html.to_string()),
    }
}

/// Deterministic generator for tests and local runs without an API key.
#[derive(Debug, Clone)]
pub struct MockGenerator {
    pub title: String,
    pub content_html: String,
}

#[async_trait]
impl ArticleGenerator for MockGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedArticle> {
        Ok(GeneratedArticle {
            title: self.title.clone(),
            content_html: self.content_html.clone(),
            tags: request.tags.clone(),
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Adapter over one generation topic. Generated drafts land unpublished so an
/// editor reviews them before they go live.
pub struct AiGenerationAdapter {
    name: String,
    request: GenerationRequest,
    timeout: Duration,
    generator: Arc<dyn ArticleGenerator>,
}

impl AiGenerationAdapter {
    pub fn new(name: &str, topic: &str, generator: Arc<dyn ArticleGenerator>) -> Self {
        Self {
            name: name.to_string(),
            request: GenerationRequest {
                topic: topic.to_string(),
                tags: BTreeSet::new(),
            },
            timeout: DEFAULT_SOURCE_TIMEOUT,
            generator,
        }
    }

    pub fn from_config(cfg: &SourceConfig, generator: Arc<dyn ArticleGenerator>) -> Self {
        let mut adapter = Self::new(&cfg.name, cfg.topic.as_deref().unwrap_or_default(), generator);
        adapter.timeout = cfg.timeout();
        adapter
    }
}

#[async_trait]
impl SourceAdapter for AiGenerationAdapter {
    async fn fetch_candidates(&self, ctx: &IngestContext) -> Result<AdapterBatch> {
        let generated = self.generator.generate(&self.request).await?;

        let mut batch = AdapterBatch::default();
        let draft = ArticleDraft {
            title: generated.title.clone(),
            content: generated.content_html,
            author: None,
            tags: generated.tags,
            source_type: SourceType::Ai,
            source_url: None,
            published_at: None,
            is_published: false,
        };

        match crate::ingest::assemble_candidate(ctx, draft).await {
            Ok(Some(candidate)) => batch.candidates.push(candidate),
            Ok(None) => batch.skipped += 1,
            Err(e) => {
                warn!(source = %self.name, item = %generated.title, error = ?e, "generated article failed; skipping");
                batch.item_errors.push(format!("'{}': {e:#}", generated.title));
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headline_is_lifted_from_h1() {
        let html = "<h1>Big News</h1><p>Body text.</p>";
        let (title, rest) = split_headline(html, "fallback");
        assert_eq!(title, "Big News");
        assert_eq!(rest, "<p>Body text.</p>");
    }

    #[test]
    fn missing_h1_falls_back_to_topic() {
        let (title, rest) = split_headline("<p>Only body.</p>", "the topic");
        assert_eq!(title, "the topic");
        assert_eq!(rest, "<p>Only body.</p>");
    }
}
