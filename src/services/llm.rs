use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::LlmConfig;
use crate::services::error::GenerationError;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anything that can turn a system prompt and a user turn into raw text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, GenerationError>;
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

/// Client for an Anthropic-style Messages endpoint.
pub struct LLMClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LLMClient {
    pub fn new(config: LlmConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(LLMClient { client, config })
    }
}

#[async_trait]
impl CompletionClient for LLMClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, GenerationError> {
        let response = self
            .client
            .post(&self.config.api_url)
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&json!({
                "model": self.config.model,
                "max_tokens": self.config.max_tokens,
                "system": system,
                "messages": [{ "role": "user", "content": user }],
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Upstream(format!(
                "status {status}: {body}"
            )));
        }

        let message: MessagesResponse = response.json().await?;

        // The model answers with a single text block; anything else is unusable.
        message
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .map(|block| block.text)
            .ok_or_else(|| GenerationError::Upstream("response had no text block".into()))
    }
}
