use super::{types::CheckResult, validator::Validator};
use crate::{Error, Result, config::ModerationConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tracing::debug;

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Scores each sentence in `[0, 1]`; higher means more toxic.
#[async_trait]
pub trait ToxicityScorer: Send + Sync {
    async fn score(&self, sentences: &[String]) -> Result<Vec<f32>>;
}

/// Client for an OpenAI-compatible `/moderations` endpoint.
pub struct ModerationClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ModerationRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct ModerationResponse {
    results: Vec<ModerationResult>,
}

#[derive(Debug, Deserialize)]
struct ModerationResult {
    #[serde(default)]
    category_scores: HashMap<String, f32>,
}

impl ModerationClient {
    /// `fallback_base_url` is used when the moderation config has no base URL of its own.
    pub fn new(
        config: &ModerationConfig,
        fallback_base_url: &str,
        api_key: impl Into<String>,
    ) -> Result<Self> {
        let base = [config.base_url.as_str(), fallback_base_url]
            .into_iter()
            .find(|url| !url.trim().is_empty())
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/');

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            endpoint: format!("{}/moderations", base),
            api_key: api_key.into(),
            model: config.model.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ToxicityScorer for ModerationClient {
    async fn score(&self, sentences: &[String]) -> Result<Vec<f32>> {
        debug!("Scoring {} sentences via {}", sentences.len(), self.endpoint);

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&ModerationRequest {
                model: &self.model,
                input: sentences,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::guardrail(format!(
                "Moderation request failed with status {}: {}",
                status, body
            )));
        }

        let parsed: ModerationResponse = response.json().await?;
        if parsed.results.len() != sentences.len() {
            return Err(Error::guardrail(format!(
                "Moderation returned {} results for {} sentences",
                parsed.results.len(),
                sentences.len()
            )));
        }

        Ok(parsed
            .results
            .into_iter()
            .map(|r| r.category_scores.into_values().fold(0.0_f32, f32::max))
            .collect())
    }
}

/// Sentence-level toxicity validator. The fix drops toxic sentences.
pub struct ToxicLanguage {
    scorer: Arc<dyn ToxicityScorer>,
    threshold: f32,
}

impl ToxicLanguage {
    pub fn new(scorer: Arc<dyn ToxicityScorer>, threshold: f32) -> Self {
        Self { scorer, threshold }
    }
}

#[async_trait]
impl Validator for ToxicLanguage {
    fn name(&self) -> &str {
        "toxic_language"
    }

    async fn check(&self, text: &str) -> Result<CheckResult> {
        let sentences: Vec<String> = split_sentences(text)
            .into_iter()
            .map(str::to_string)
            .collect();
        if sentences.is_empty() {
            return Ok(CheckResult::Pass);
        }

        let scores = self.scorer.score(&sentences).await?;

        let (toxic, clean): (Vec<_>, Vec<_>) = sentences
            .into_iter()
            .zip(scores)
            .partition(|(_, score)| *score >= self.threshold);

        if toxic.is_empty() {
            return Ok(CheckResult::Pass);
        }

        let listed: Vec<String> = toxic.iter().map(|(s, _)| format!("- {}", s)).collect();
        let reason = format!(
            "The following sentences were found to be toxic:\n{}",
            listed.join("\n")
        );
        let fixed: Vec<String> = clean.into_iter().map(|(s, _)| s).collect();

        Ok(CheckResult::fail(reason, Some(fixed.join(" "))))
    }
}

/// Splits on `.`, `!` or `?` followed by whitespace or end of text.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let at_boundary = match chars.peek() {
            None => true,
            Some((_, next)) => next.is_whitespace(),
        };
        if at_boundary {
            let end = idx + c.len_utf8();
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}
