use std::time::Duration;

use async_trait::async_trait;

use crate::auth::providers::{Provider, ResolvedProvider};
use crate::auth::require_credentials;
use crate::error::{NyayError, Result};

/// A text-in, text-out language model. One request, one complete response.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Human-readable `provider/model` label for logs.
    fn name(&self) -> String;
}

/// Multi-provider LLM client
pub struct LlmClient {
    provider: Provider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    client: reqwest::Client,
}

impl LlmClient {
    /// Fails with a configuration error, before any network traffic, when
    /// the provider needs a key that was not supplied.
    pub fn new(resolved: &ResolvedProvider, timeout: Duration, temperature: f32) -> Result<Self> {
        require_credentials(resolved)?;
        Ok(Self {
            provider: resolved.provider,
            endpoint: resolved.endpoint.trim_end_matches('/').to_string(),
            model: resolved.model.clone(),
            api_key: resolved.api_key.clone(),
            temperature,
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        })
    }

    /// Anthropic Messages API
    async fn chat_anthropic(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/v1/messages", self.endpoint);

        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": 1024,
            "messages": [
                { "role": "user", "content": prompt },
            ],
            "temperature": self.temperature,
        });

        let mut req = self.client.post(&url).json(&body);

        if let Some(ref key) = self.api_key {
            req = req
                .header("x-api-key", key)
                .header("anthropic-version", "2023-06-01");
        }

        let json = self.send(req).await?;

        json.get("content")
            .and_then(|c| c.get(0))
            .and_then(|b| b.get("text"))
            .and_then(|t| t.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| NyayError::Generation("LLM returned empty response".into()))
    }

    /// OpenAI-compatible API (Groq, OpenAI, Ollama)
    async fn chat_openai_compat(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.endpoint);

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "user", "content": prompt },
            ],
            "temperature": self.temperature,
            "max_tokens": 1024,
        });

        let mut req = self.client.post(&url).json(&body);

        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }

        let json = self.send(req).await?;

        json.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| NyayError::Generation("LLM returned empty response".into()))
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<serde_json::Value> {
        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                NyayError::Generation(format!("{} timed out", self.name()))
            } else {
                NyayError::Generation(format!("{} request failed: {}", self.name(), e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(NyayError::Generation(format!(
                "LLM returned {}: {}",
                status, text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| NyayError::Generation(format!("unreadable LLM response: {}", e)))
    }
}

#[async_trait]
impl LanguageModel for LlmClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        match self.provider {
            Provider::Anthropic => self.chat_anthropic(prompt).await,
            Provider::Groq | Provider::OpenAI | Provider::Ollama => {
                self.chat_openai_compat(prompt).await
            }
        }
    }

    fn name(&self) -> String {
        format!("{}/{}", self.provider, self.model)
    }
}
