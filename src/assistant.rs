//! Conversation orchestrator: retrieval, prompt assembly and one model call
//! per user question.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::auth::require_credentials;
use crate::config::Config;
use crate::conversation::{recent_turns, ConversationHistory, Turn};
use crate::embeddings::provider::from_settings;
use crate::embeddings::{Retriever, ScoredChunk, SharedIndex, VectorIndex};
use crate::error::{NyayError, Result};
use crate::llm::{LanguageModel, LlmClient, PromptTemplate};

pub struct Assistant {
    retriever: Retriever,
    llm: Arc<dyn LanguageModel>,
    template: PromptTemplate,
    timeout: Duration,
    max_history_turns: usize,
    condense_question: bool,
}

impl Assistant {
    pub fn new(retriever: Retriever, llm: Arc<dyn LanguageModel>, template: PromptTemplate) -> Self {
        Self {
            retriever,
            llm,
            template,
            timeout: Duration::from_secs(crate::config::DEFAULT_REQUEST_TIMEOUT_SECS),
            max_history_turns: crate::config::DEFAULT_MAX_HISTORY_TURNS,
            condense_question: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_history_turns(mut self, max_turns: usize) -> Self {
        self.max_history_turns = max_turns;
        self
    }

    pub fn with_condense_question(mut self, enabled: bool) -> Self {
        self.condense_question = enabled;
        self
    }

    /// Build the assistant from configuration. Credentials are checked
    /// before the index is touched or any request is made.
    pub fn from_config(config: &Config) -> Result<Self> {
        require_credentials(&config.llm)?;
        let retriever = open_retriever(config)?;
        let llm = LlmClient::new(&config.llm, config.request_timeout(), config.temperature)?;

        Ok(Self::new(retriever, Arc::new(llm), config.template())
            .with_timeout(config.request_timeout())
            .with_max_history_turns(config.max_history_turns)
            .with_condense_question(config.condense_question))
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// Answer `question` given the prior turns. Does not modify history.
    pub async fn ask(&self, question: &str, history: &[Turn]) -> Result<String> {
        let (prompt, _) = self.build_prompt(question, history).await?;

        let started = Instant::now();
        let answer = self.generate(&prompt).await?;
        info!(
            model = %self.llm.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "generated answer"
        );
        Ok(answer)
    }

    /// Answer and, only on success, record the question and answer together.
    pub async fn respond(
        &self,
        question: &str,
        history: &mut ConversationHistory,
    ) -> Result<String> {
        let answer = match self.ask(question, history.all()).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "question failed, history left unchanged");
                return Err(e);
            }
        };
        history.append(Turn::user(question));
        history.append(Turn::assistant(answer.clone()));
        Ok(answer)
    }

    /// Retrieve context and render the final prompt without calling the
    /// model for the answer. Returns the prompt and the retrieved chunks.
    pub async fn build_prompt(
        &self,
        question: &str,
        history: &[Turn],
    ) -> Result<(String, Vec<ScoredChunk>)> {
        let window = recent_turns(history, self.max_history_turns);

        let search_query = if self.condense_question && !window.is_empty() {
            let standalone = self
                .generate(&self.template.condense(window, question))
                .await?;
            debug!(standalone = %standalone, "condensed follow-up question");
            if standalone.is_empty() {
                question.to_string()
            } else {
                standalone
            }
        } else {
            question.to_string()
        };

        let retrieved = self.retriever.retrieve(&search_query).await?;
        let context: Vec<&str> = retrieved.iter().map(|r| r.chunk.text.as_str()).collect();
        let prompt = self.template.render(&context, window, question);
        Ok((prompt, retrieved))
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        match tokio::time::timeout(self.timeout, self.llm.generate(prompt)).await {
            Ok(Ok(text)) => Ok(text.trim().to_string()),
            Ok(Err(NyayError::Generation(msg))) => Err(NyayError::Generation(msg)),
            Ok(Err(other)) => Err(NyayError::Generation(other.to_string())),
            Err(_) => Err(NyayError::Generation(format!(
                "no response from {} within {}s",
                self.llm.name(),
                self.timeout.as_secs_f32()
            ))),
        }
    }
}

/// Open the persisted index and pair it with the configured embedder.
///
/// The index must have been built with the same embedding model, otherwise
/// query vectors would live in a different space.
pub fn open_retriever(config: &Config) -> Result<Retriever> {
    let embedder = from_settings(&config.embedding_settings())?;
    let index = VectorIndex::open(&config.index_path)?;

    let built_with = index.manifest().embedding_model.clone();
    if built_with != embedder.model_id() {
        return Err(NyayError::index_load(
            &config.index_path,
            format!(
                "index was built with {} but {} is configured; re-run ingest",
                built_with,
                embedder.model_id()
            ),
        ));
    }
    info!(chunks = index.len(), model = %built_with, "loaded vector index");

    Ok(Retriever::new(
        SharedIndex::new(index),
        embedder,
        config.top_k,
        config.query_cache_size,
    ))
}
