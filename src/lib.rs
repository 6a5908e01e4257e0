// Library interface for nyaysetu

pub mod assistant;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod embeddings;
pub mod error;
pub mod ingest;
pub mod llm;

// Re-export commonly used types
pub use assistant::Assistant;
pub use config::Config;
pub use conversation::{ConversationHistory, Session, Speaker, Turn};
pub use error::{NyayError, Result};
