use super::types::*;
use crate::{Error, Result, config::LlmConfig};
use async_openai::{Client, config::OpenAIConfig, types as openai_types};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion>;
}

pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    timeout: Duration,
}

impl OpenAiClient {
    pub fn new(config: LlmConfig) -> Self {
        let mut openai_config = OpenAIConfig::new().with_api_key(config.api_key);

        if !config.base_url.is_empty() {
            openai_config = openai_config.with_api_base(config.base_url);
        }

        let client = Client::with_config(openai_config);

        Self {
            client,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        debug!(
            "Creating chat completion with model {} (max_tokens={}, temperature={})",
            request.model, request.max_tokens, request.temperature
        );

        let mut messages = Vec::new();
        for msg in request.messages() {
            messages.push(msg.to_openai_message()?);
        }

        let mut request_builder = openai_types::CreateChatCompletionRequestArgs::default();
        request_builder
            .model(&request.model)
            .messages(messages)
            .temperature(request.temperature)
            .max_tokens(request.max_tokens);

        if let Some(ref user) = request.user {
            request_builder.user(user);
        }

        let openai_request = request_builder.build()?;

        // The timeout also bounds the SDK's own rate-limit backoff.
        let response = tokio::time::timeout(self.timeout, self.client.chat().create(openai_request))
            .await
            .map_err(|_| Error::Timeout {
                secs: self.timeout.as_secs(),
            })??;

        debug!(
            "Received chat completion response with {} choices",
            response.choices.len()
        );

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::llm("Model returned no choices"))?;

        let usage = response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(Completion {
            id: response.id,
            model: response.model,
            text: choice.message.content.unwrap_or_default(),
            finish_reason: choice.finish_reason.map(|fr| format!("{fr:?}")),
            usage,
        })
    }
}
