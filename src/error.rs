use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NyayError {
    /// Bad or missing source directory, nothing loadable, or a failed build.
    #[error("Ingestion failed: {0}")]
    Ingestion(String),

    #[error("No chunks were produced from the source documents")]
    EmptyCorpus,

    #[error("Could not load index at {path}: {reason}")]
    IndexLoad { path: String, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Answer generation failed: {0}")]
    Generation(String),

    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    /// Raised by embedding adapters; callers re-wrap it as an ingestion or
    /// retrieval failure depending on when it happened.
    #[error("Embedding provider error: {0}")]
    Embedding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NyayError {
    pub fn index_load(path: &Path, reason: impl Into<String>) -> Self {
        NyayError::IndexLoad {
            path: path.display().to_string(),
            reason: reason.into(),
        }
    }

    /// Errors raised while answering a single question. The session survives
    /// these; everything else is fatal for the command that hit it.
    pub fn is_query_time(&self) -> bool {
        matches!(self, NyayError::Retrieval(_) | NyayError::Generation(_))
    }

    /// Text shown to a chat user in place of an answer.
    pub fn user_message(&self) -> String {
        match self {
            NyayError::Retrieval(_) => {
                "Sorry, I couldn't search the legal knowledge base just now. Please try asking again."
                    .to_string()
            }
            NyayError::Generation(_) => {
                "Sorry, I couldn't generate an answer just now. Please try asking again."
                    .to_string()
            }
            other => format!("Something went wrong: {}", other),
        }
    }
}

pub type Result<T> = std::result::Result<T, NyayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_time_errors_are_recoverable() {
        assert!(NyayError::Retrieval("x".into()).is_query_time());
        assert!(NyayError::Generation("x".into()).is_query_time());
        assert!(!NyayError::EmptyCorpus.is_query_time());
        assert!(!NyayError::Configuration("x".into()).is_query_time());
    }

    #[test]
    fn user_message_hides_provider_details() {
        let err = NyayError::Generation("HTTP 500 from upstream: {\"secret\":1}".into());
        let msg = err.user_message();
        assert!(!msg.contains("secret"));
        assert!(msg.contains("try asking again"));
    }

    #[test]
    fn index_load_carries_path() {
        let err = NyayError::index_load(Path::new("/tmp/idx"), "missing manifest");
        assert_eq!(
            err.to_string(),
            "Could not load index at /tmp/idx: missing manifest"
        );
    }
}
