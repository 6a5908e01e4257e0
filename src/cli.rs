use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Overrides;

#[derive(Parser)]
#[command(
    name = "nyaysetu",
    about = "Retrieval-augmented legal assistant for Indian law",
    version
)]
pub struct Cli {
    /// Enable verbose (debug) logging
    #[arg(global = true, long, short)]
    pub verbose: bool,

    /// Path to a JSON config file
    #[arg(global = true, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by every command that answers questions.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct AnswerArgs {
    /// Number of passages retrieved per question
    #[arg(long)]
    pub top_k: Option<usize>,

    /// LLM provider (groq, openai, anthropic, ollama)
    #[arg(long)]
    pub provider: Option<String>,

    /// LLM model name
    #[arg(long)]
    pub model: Option<String>,

    /// Directory of the persisted index
    #[arg(long)]
    pub index_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load legal documents, split, embed and persist the vector index
    Ingest {
        /// Directory containing .pdf, .txt and .md sources
        #[arg(long)]
        source_dir: Option<PathBuf>,

        /// Where to write the index
        #[arg(long)]
        index_path: Option<PathBuf>,

        /// Maximum chunk length in characters
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Characters shared between consecutive chunks
        #[arg(long)]
        chunk_overlap: Option<usize>,

        /// Embedding provider (ollama, openai, gemini, hashing)
        #[arg(long)]
        embedding_provider: Option<String>,

        /// Embedding model name
        #[arg(long)]
        embedding_model: Option<String>,
    },

    /// Answer a single question
    Ask {
        /// The legal question
        question: String,

        #[command(flatten)]
        args: AnswerArgs,
    },

    /// Interactive conversation (/reset, /history, /exit)
    Chat {
        #[command(flatten)]
        args: AnswerArgs,
    },

    /// Show the passages retrieved for a query, without calling the LLM
    Search {
        /// Search query
        query: String,

        /// Number of passages to show
        #[arg(long)]
        top_k: Option<usize>,

        /// Directory of the persisted index
        #[arg(long)]
        index_path: Option<PathBuf>,
    },

    /// Show index statistics
    Stats {
        /// Directory of the persisted index
        #[arg(long)]
        index_path: Option<PathBuf>,
    },
}

impl Commands {
    /// CLI flags that feed into configuration resolution.
    pub fn overrides(&self) -> Overrides {
        match self {
            Commands::Ingest {
                source_dir,
                index_path,
                chunk_size,
                chunk_overlap,
                embedding_provider,
                embedding_model,
            } => Overrides {
                source_dir: source_dir.clone(),
                index_path: index_path.clone(),
                chunk_size: *chunk_size,
                chunk_overlap: *chunk_overlap,
                embedding_provider: embedding_provider.clone(),
                embedding_model: embedding_model.clone(),
                ..Default::default()
            },
            Commands::Ask { args, .. } | Commands::Chat { args } => Overrides {
                index_path: args.index_path.clone(),
                top_k: args.top_k,
                llm_provider: args.provider.clone(),
                llm_model: args.model.clone(),
                ..Default::default()
            },
            Commands::Search {
                top_k, index_path, ..
            } => Overrides {
                index_path: index_path.clone(),
                top_k: *top_k,
                ..Default::default()
            },
            Commands::Stats { index_path } => Overrides {
                index_path: index_path.clone(),
                ..Default::default()
            },
        }
    }
}
