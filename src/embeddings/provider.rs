use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::hashing::HashingEmbedder;
use crate::error::{NyayError, Result};

/// Maps text to fixed-length vectors. Implementations must be deterministic
/// for a fixed model: the same text always yields the same vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embeddings for a batch of texts, one vector per input, in order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Generate embedding for single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let batch = self.embed_batch(&[text.to_string()]).await?;
        batch
            .into_iter()
            .next()
            .ok_or_else(|| NyayError::Embedding("No embedding returned".into()))
    }

    /// Identifier recorded in the index manifest, e.g. `ollama/all-minilm`.
    fn model_id(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    Ollama,
    OpenAI,
    Gemini,
    Hashing,
}

impl EmbeddingBackend {
    pub fn default_model(&self) -> &'static str {
        match self {
            EmbeddingBackend::Ollama => "all-minilm",
            EmbeddingBackend::OpenAI => "text-embedding-3-small",
            EmbeddingBackend::Gemini => "text-embedding-004",
            EmbeddingBackend::Hashing => "hashing-384",
        }
    }

    pub fn env_var_name(&self) -> &'static str {
        match self {
            EmbeddingBackend::OpenAI => "OPENAI_API_KEY",
            EmbeddingBackend::Gemini => "GEMINI_API_KEY",
            EmbeddingBackend::Ollama | EmbeddingBackend::Hashing => "",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<EmbeddingBackend> {
        match s.trim().to_lowercase().as_str() {
            "ollama" | "local" => Some(EmbeddingBackend::Ollama),
            "openai" => Some(EmbeddingBackend::OpenAI),
            "gemini" | "google" => Some(EmbeddingBackend::Gemini),
            "hashing" | "hash" | "offline" => Some(EmbeddingBackend::Hashing),
            _ => None,
        }
    }
}

impl fmt::Display for EmbeddingBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbeddingBackend::Ollama => write!(f, "ollama"),
            EmbeddingBackend::OpenAI => write!(f, "openai"),
            EmbeddingBackend::Gemini => write!(f, "gemini"),
            EmbeddingBackend::Hashing => write!(f, "hashing"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmbeddingSettings {
    pub backend: EmbeddingBackend,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl EmbeddingSettings {
    /// The id an adapter built from these settings will report.
    pub fn model_id(&self) -> String {
        format!("{}/{}", self.backend, self.model)
    }
}

/// Build the adapter for the configured backend.
pub fn from_settings(settings: &EmbeddingSettings) -> Result<Arc<dyn EmbeddingProvider>> {
    let needs_key = !settings.backend.env_var_name().is_empty();
    let api_key = match (&settings.api_key, needs_key) {
        (Some(key), _) => key.clone(),
        (None, false) => String::new(),
        (None, true) => {
            return Err(NyayError::Configuration(format!(
                "{} embeddings require {}",
                settings.backend,
                settings.backend.env_var_name()
            )))
        }
    };

    let client = http_client(settings.timeout);
    let model = settings.model.clone();

    Ok(match settings.backend {
        EmbeddingBackend::Ollama => Arc::new(OllamaEmbedder { client, model }),
        EmbeddingBackend::OpenAI => Arc::new(OpenAiEmbedder {
            client,
            model,
            api_key,
        }),
        EmbeddingBackend::Gemini => Arc::new(GeminiEmbedder {
            client,
            model,
            api_key,
        }),
        EmbeddingBackend::Hashing => Arc::new(HashingEmbedder::named(&settings.model)),
    })
}

fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

fn request_error(backend: &str, err: reqwest::Error) -> NyayError {
    NyayError::Embedding(format!("{} request failed: {}", backend, err))
}

fn parse_values(value: Option<&serde_json::Value>, backend: &str) -> Result<Vec<f32>> {
    let values = value
        .and_then(|v| v.as_array())
        .ok_or_else(|| NyayError::Embedding(format!("Invalid {} embedding response", backend)))?;
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            v.as_f64().map(|f| f as f32).ok_or_else(|| {
                NyayError::Embedding(format!(
                    "{} embedding has a non-numeric value at position {}",
                    backend, i
                ))
            })
        })
        .collect()
}

pub struct OpenAiEmbedder {
    client: reqwest::Client,
    model: String,
    api_key: String,
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        #[derive(Deserialize)]
        struct EmbeddingResponse {
            data: Vec<EmbeddingData>,
        }

        #[derive(Deserialize)]
        struct EmbeddingData {
            index: usize,
            embedding: Vec<f32>,
        }

        let response = self
            .client
            .post("https://api.openai.com/v1/embeddings")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({
                "model": self.model,
                "input": texts,
            }))
            .send()
            .await
            .map_err(|e| request_error("OpenAI", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(NyayError::Embedding(format!(
                "OpenAI API returned {}: {}",
                status, text
            )));
        }

        let mut result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| request_error("OpenAI", e))?;
        // The API documents `index` but not ordering; sort to keep inputs aligned.
        result.data.sort_by_key(|d| d.index);
        Ok(result.data.into_iter().map(|d| d.embedding).collect())
    }

    fn model_id(&self) -> String {
        format!("openai/{}", self.model)
    }
}

pub struct GeminiEmbedder {
    client: reqwest::Client,
    model: String,
    api_key: String,
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for text in texts {
            let response = self
                .client
                .post(format!(
                    "https://generativelanguage.googleapis.com/v1/models/{}:embedContent",
                    self.model
                ))
                .header("x-goog-api-key", &self.api_key)
                .json(&serde_json::json!({
                    "content": {
                        "parts": [{
                            "text": text
                        }]
                    }
                }))
                .send()
                .await
                .map_err(|e| request_error("Gemini", e))?;

            if !response.status().is_success() {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                return Err(NyayError::Embedding(format!(
                    "Gemini API returned {}: {}",
                    status, text
                )));
            }

            let result: serde_json::Value = response
                .json()
                .await
                .map_err(|e| request_error("Gemini", e))?;
            let embedding = parse_values(
                result.get("embedding").and_then(|e| e.get("values")),
                "Gemini",
            )?;

            embeddings.push(embedding);
        }

        Ok(embeddings)
    }

    fn model_id(&self) -> String {
        format!("gemini/{}", self.model)
    }
}

pub struct OllamaEmbedder {
    client: reqwest::Client,
    model: String,
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for text in texts {
            let response = self
                .client
                .post("http://localhost:11434/api/embeddings")
                .json(&serde_json::json!({
                    "model": self.model,
                    "prompt": text,
                }))
                .send()
                .await
                .map_err(|e| request_error("Ollama", e))?;

            if !response.status().is_success() {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                return Err(NyayError::Embedding(format!(
                    "Ollama API returned {}: {}",
                    status, text
                )));
            }

            let result: serde_json::Value = response
                .json()
                .await
                .map_err(|e| request_error("Ollama", e))?;
            embeddings.push(parse_values(result.get("embedding"), "Ollama")?);
        }

        Ok(embeddings)
    }

    fn model_id(&self) -> String {
        format!("ollama/{}", self.model)
    }
}
