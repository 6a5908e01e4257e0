pub mod client;
pub mod prompts;

pub use client::{LanguageModel, LlmClient};
pub use prompts::{PromptOverrides, PromptTemplate};
