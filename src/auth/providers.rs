use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Groq,
    OpenAI,
    Anthropic,
    Ollama,
}

impl Provider {
    pub fn all() -> &'static [Provider] {
        &[
            Provider::Groq,
            Provider::OpenAI,
            Provider::Anthropic,
            Provider::Ollama,
        ]
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Provider::Groq => "https://api.groq.com/openai/v1",
            Provider::OpenAI => "https://api.openai.com/v1",
            Provider::Anthropic => "https://api.anthropic.com",
            Provider::Ollama => "http://localhost:11434/v1",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Groq => "llama-3.3-70b-versatile",
            Provider::OpenAI => "gpt-4o-mini",
            Provider::Anthropic => "claude-sonnet-4-5-20250929",
            Provider::Ollama => "llama3.2:3b",
        }
    }

    pub fn requires_auth(&self) -> bool {
        match self {
            Provider::Groq | Provider::OpenAI | Provider::Anthropic => true,
            Provider::Ollama => false,
        }
    }

    pub fn env_var_name(&self) -> &'static str {
        match self {
            Provider::Groq => "GROQ_API_KEY",
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::Ollama => "",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Groq => "Groq",
            Provider::OpenAI => "OpenAI",
            Provider::Anthropic => "Anthropic (Claude)",
            Provider::Ollama => "Ollama (local)",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Provider> {
        match s.trim().to_lowercase().as_str() {
            "groq" => Some(Provider::Groq),
            "openai" | "gpt" => Some(Provider::OpenAI),
            "anthropic" | "claude" => Some(Provider::Anthropic),
            "ollama" | "local" => Some(Provider::Ollama),
            _ => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Groq => write!(f, "groq"),
            Provider::OpenAI => write!(f, "openai"),
            Provider::Anthropic => write!(f, "anthropic"),
            Provider::Ollama => write!(f, "ollama"),
        }
    }
}

/// A fully resolved provider configuration; no further lookups needed.
#[derive(Debug, Clone)]
pub struct ResolvedProvider {
    pub provider: Provider,
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
}
