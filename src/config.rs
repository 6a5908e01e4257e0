use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::providers::ResolvedProvider;
use crate::auth::{self, ProviderRequest};
use crate::embeddings::{EmbeddingBackend, EmbeddingSettings, SimilarityMetric};
use crate::error::{NyayError, Result};
use crate::ingest::splitter::RecursiveSplitter;
use crate::llm::{PromptOverrides, PromptTemplate};

pub const DEFAULT_SOURCE_DIR: &str = "./data";
pub const DEFAULT_INDEX_PATH: &str = "./legal_vector_store";
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;
pub const DEFAULT_TOP_K: usize = 4;
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 64;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_MAX_HISTORY_TURNS: usize = 20;
pub const DEFAULT_QUERY_CACHE_SIZE: usize = 128;

/// Optional settings read from the JSON config file. Every field may be
/// omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub source_dir: Option<String>,
    pub index_path: Option<String>,
    pub chunk_size: Option<usize>,
    pub chunk_overlap: Option<usize>,
    pub top_k: Option<usize>,
    pub embedding_provider: Option<String>,
    pub embedding_model: Option<String>,
    pub embedding_api_key: Option<String>,
    pub embed_batch_size: Option<usize>,
    pub metric: Option<SimilarityMetric>,
    pub llm_provider: Option<String>,
    pub llm_model: Option<String>,
    pub llm_endpoint: Option<String>,
    pub llm_api_key: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub temperature: Option<f32>,
    pub max_history_turns: Option<usize>,
    pub query_cache_size: Option<usize>,
    pub condense_question: Option<bool>,
    pub prompt: PromptOverrides,
}

impl FileConfig {
    pub fn read(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            NyayError::Configuration(format!("Cannot read config {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            NyayError::Configuration(format!("Invalid config {}: {}", path.display(), e))
        })
    }

    /// `<config_dir>/nyaysetu/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("nyaysetu").join("config.json"))
    }
}

/// Command-line flags. These win over everything else.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub source_dir: Option<PathBuf>,
    pub index_path: Option<PathBuf>,
    pub chunk_size: Option<usize>,
    pub chunk_overlap: Option<usize>,
    pub top_k: Option<usize>,
    pub embedding_provider: Option<String>,
    pub embedding_model: Option<String>,
    pub llm_provider: Option<String>,
    pub llm_model: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory scanned for `.pdf`, `.txt` and `.md` sources
    pub source_dir: PathBuf,
    /// Directory holding the persisted index
    pub index_path: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub embedding_backend: EmbeddingBackend,
    pub embedding_model: String,
    pub embedding_api_key: Option<String>,
    pub embed_batch_size: usize,
    pub metric: SimilarityMetric,
    /// Resolved LLM provider configuration
    pub llm: ResolvedProvider,
    pub request_timeout_secs: u64,
    pub temperature: f32,
    pub max_history_turns: usize,
    pub query_cache_size: usize,
    pub condense_question: bool,
    pub prompt: PromptOverrides,
}

impl Config {
    /// Load from the config file (explicit path, else the default location
    /// when it exists), the process environment and CLI overrides.
    pub fn load(config_path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let file = match config_path {
            Some(path) => FileConfig::read(&expand_path(&path.to_string_lossy()))?,
            None => match FileConfig::default_path() {
                Some(path) if path.is_file() => FileConfig::read(&path)?,
                _ => FileConfig::default(),
            },
        };
        Self::resolve(file, |key| std::env::var(key).ok(), overrides)
    }

    /// Merge defaults < file < environment < overrides and validate.
    pub fn resolve(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
        overrides: &Overrides,
    ) -> Result<Self> {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let source_dir = overrides
            .source_dir
            .clone()
            .or_else(|| env("NYAYSETU_SOURCE_DIR").map(|s| expand_path(&s)))
            .or_else(|| file.source_dir.as_deref().map(expand_path))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE_DIR));

        let index_path = overrides
            .index_path
            .clone()
            .or_else(|| env("NYAYSETU_INDEX_PATH").map(|s| expand_path(&s)))
            .or_else(|| file.index_path.as_deref().map(expand_path))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INDEX_PATH));

        let chunk_size = pick_number(
            overrides.chunk_size,
            &env,
            "NYAYSETU_CHUNK_SIZE",
            file.chunk_size,
            DEFAULT_CHUNK_SIZE,
        )?;
        let chunk_overlap = pick_number(
            overrides.chunk_overlap,
            &env,
            "NYAYSETU_CHUNK_OVERLAP",
            file.chunk_overlap,
            DEFAULT_CHUNK_OVERLAP,
        )?;
        let top_k = pick_number(
            overrides.top_k,
            &env,
            "NYAYSETU_TOP_K",
            file.top_k,
            DEFAULT_TOP_K,
        )?;

        let backend_name = overrides
            .embedding_provider
            .clone()
            .or_else(|| env("NYAYSETU_EMBEDDING_PROVIDER"))
            .or_else(|| file.embedding_provider.clone());
        let embedding_backend = match backend_name {
            Some(name) => EmbeddingBackend::from_str_loose(&name).ok_or_else(|| {
                NyayError::Configuration(format!("Unknown embedding provider: {}", name))
            })?,
            None => EmbeddingBackend::Ollama,
        };
        let embedding_model = overrides
            .embedding_model
            .clone()
            .or_else(|| env("NYAYSETU_EMBEDDING_MODEL"))
            .or_else(|| file.embedding_model.clone())
            .unwrap_or_else(|| embedding_backend.default_model().to_string());
        let embedding_api_key = match embedding_backend.env_var_name() {
            "" => None,
            var => env(var).or_else(|| file.embedding_api_key.clone()),
        };

        let llm = auth::resolve_provider(
            &ProviderRequest {
                provider: overrides
                    .llm_provider
                    .clone()
                    .or_else(|| env("NYAYSETU_LLM_PROVIDER"))
                    .or_else(|| file.llm_provider.clone()),
                model: overrides
                    .llm_model
                    .clone()
                    .or_else(|| env("NYAYSETU_LLM_MODEL"))
                    .or_else(|| file.llm_model.clone()),
                endpoint: env("NYAYSETU_LLM_ENDPOINT").or_else(|| file.llm_endpoint.clone()),
                api_key: file.llm_api_key.clone(),
            },
            &env,
        )?;

        let config = Config {
            source_dir,
            index_path,
            chunk_size,
            chunk_overlap,
            top_k,
            embedding_backend,
            embedding_model,
            embedding_api_key,
            embed_batch_size: file.embed_batch_size.unwrap_or(DEFAULT_EMBED_BATCH_SIZE),
            metric: file.metric.unwrap_or_default(),
            llm,
            request_timeout_secs: file
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            temperature: file.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_history_turns: file.max_history_turns.unwrap_or(DEFAULT_MAX_HISTORY_TURNS),
            query_cache_size: file.query_cache_size.unwrap_or(DEFAULT_QUERY_CACHE_SIZE),
            condense_question: file.condense_question.unwrap_or(false),
            prompt: file.prompt,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(NyayError::Configuration(
                "chunk_size must be greater than 0".into(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(NyayError::Configuration(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(NyayError::Configuration("top_k must be greater than 0".into()));
        }
        if self.embed_batch_size == 0 {
            return Err(NyayError::Configuration(
                "embed_batch_size must be greater than 0".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(NyayError::Configuration(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(NyayError::Configuration(format!(
                "temperature must be between 0 and 2, got {}",
                self.temperature
            )));
        }
        Ok(())
    }

    pub fn splitter(&self) -> Result<RecursiveSplitter> {
        RecursiveSplitter::new(self.chunk_size, self.chunk_overlap)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn embedding_settings(&self) -> EmbeddingSettings {
        EmbeddingSettings {
            backend: self.embedding_backend,
            model: self.embedding_model.clone(),
            api_key: self.embedding_api_key.clone(),
            timeout: self.request_timeout(),
        }
    }

    pub fn template(&self) -> PromptTemplate {
        PromptTemplate::with_overrides(&self.prompt)
    }
}

fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

fn pick_number<T: FromStr + Copy>(
    flag: Option<T>,
    env: impl Fn(&str) -> Option<String>,
    var: &str,
    file: Option<T>,
    default: T,
) -> Result<T> {
    if let Some(value) = flag {
        return Ok(value);
    }
    if let Some(raw) = env(var) {
        return raw.trim().parse().map_err(|_| {
            NyayError::Configuration(format!("{} must be a non-negative integer, got {:?}", var, raw))
        });
    }
    Ok(file.unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::providers::Provider;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::resolve(FileConfig::default(), env_of(&[]), &Overrides::default())
            .unwrap();
        assert_eq!(config.source_dir, PathBuf::from("./data"));
        assert_eq!(config.index_path, PathBuf::from("./legal_vector_store"));
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.top_k, 4);
        assert_eq!(config.embedding_backend, EmbeddingBackend::Ollama);
        assert_eq!(config.embedding_model, "all-minilm");
        assert_eq!(config.llm.provider, Provider::Groq);
        assert_eq!(config.llm.model, "llama-3.3-70b-versatile");
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
        assert!(!config.condense_question);
    }

    #[test]
    fn precedence_is_file_then_env_then_flags() {
        let file = FileConfig {
            chunk_size: Some(800),
            chunk_overlap: Some(100),
            top_k: Some(6),
            ..Default::default()
        };
        let env = env_of(&[("NYAYSETU_CHUNK_SIZE", "900"), ("NYAYSETU_TOP_K", "5")]);
        let overrides = Overrides {
            top_k: Some(2),
            ..Default::default()
        };
        let config = Config::resolve(file, env, &overrides).unwrap();
        assert_eq!(config.chunk_size, 900);
        assert_eq!(config.chunk_overlap, 100);
        assert_eq!(config.top_k, 2);
    }

    #[test]
    fn overlap_not_below_size_is_rejected() {
        let overrides = Overrides {
            chunk_size: Some(200),
            chunk_overlap: Some(200),
            ..Default::default()
        };
        let err = Config::resolve(FileConfig::default(), env_of(&[]), &overrides).unwrap_err();
        assert!(matches!(err, NyayError::Configuration(_)));
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let overrides = Overrides {
            top_k: Some(0),
            ..Default::default()
        };
        assert!(Config::resolve(FileConfig::default(), env_of(&[]), &overrides).is_err());
    }

    #[test]
    fn garbage_numeric_env_is_configuration_error() {
        let err = Config::resolve(
            FileConfig::default(),
            env_of(&[("NYAYSETU_CHUNK_OVERLAP", "lots")]),
            &Overrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, NyayError::Configuration(_)));
    }

    #[test]
    fn unknown_providers_are_rejected() {
        let bad_embed = Overrides {
            embedding_provider: Some("word2vec".into()),
            ..Default::default()
        };
        assert!(Config::resolve(FileConfig::default(), env_of(&[]), &bad_embed).is_err());

        let bad_llm = Overrides {
            llm_provider: Some("mystery".into()),
            ..Default::default()
        };
        assert!(Config::resolve(FileConfig::default(), env_of(&[]), &bad_llm).is_err());
    }

    #[test]
    fn credentials_come_from_env() {
        let config = Config::resolve(
            FileConfig::default(),
            env_of(&[("GROQ_API_KEY", "gsk_live"), ("OPENAI_API_KEY", "sk-embed")]),
            &Overrides {
                embedding_provider: Some("openai".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(config.llm.api_key.as_deref(), Some("gsk_live"));
        assert_eq!(config.embedding_api_key.as_deref(), Some("sk-embed"));
        assert_eq!(config.embedding_settings().model_id(), "openai/text-embedding-3-small");
    }

    #[test]
    fn file_config_parses_partial_json_with_prompt_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "top_k": 3, "metric": "euclidean", "prompt": { "disclaimer": "See a lawyer." } }"#,
        )
        .unwrap();
        let file = FileConfig::read(&path).unwrap();
        assert_eq!(file.top_k, Some(3));
        assert_eq!(file.metric, Some(SimilarityMetric::Euclidean));

        let config = Config::resolve(file, env_of(&[]), &Overrides::default()).unwrap();
        assert_eq!(config.template().disclaimer, "See a lawyer.");
    }

    #[test]
    fn malformed_config_file_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            FileConfig::read(&path),
            Err(NyayError::Configuration(_))
        ));
    }
}
