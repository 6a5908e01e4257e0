//! Offline embedder based on feature hashing.
//!
//! Each lowercase content word is hashed with SHA-256 into one of
//! `dimensions` buckets with a ±1 sign, and the result is L2-normalised.
//! Numbers are always kept; words shorter than three characters and common
//! function words are dropped so "What is Section 420?" matches on
//! `section` and `420` alone. Texts sharing vocabulary land close together
//! under cosine similarity. It needs no network or model files.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use sha2::{Digest, Sha256};

use super::provider::EmbeddingProvider;
use super::EMBEDDING_DIM;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    name: String,
    dimensions: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::named("hashing-384")
    }
}

impl HashingEmbedder {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            dimensions: EMBEDDING_DIM,
        }
    }

    pub fn with_dimensions(name: &str, dimensions: usize) -> Self {
        Self {
            name: name.to_string(),
            dimensions: dimensions.max(1),
        }
    }

    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        for token in word_regex().find_iter(text) {
            let token = token.as_str().to_lowercase();
            if !is_content_word(&token) {
                continue;
            }
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimensions as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

const STOP_WORDS: &[&str] = &[
    "about", "all", "also", "and", "any", "are", "been", "being", "both", "but", "can",
    "could", "did", "does", "each", "every", "few", "for", "from", "had", "has", "have",
    "her", "here", "him", "his", "how", "into", "its", "just", "may", "might", "more",
    "most", "must", "not", "only", "other", "our", "over", "own", "same", "shall", "she",
    "should", "some", "such", "than", "that", "the", "their", "them", "then", "there",
    "these", "they", "this", "those", "under", "upon", "very", "was", "were", "what",
    "when", "where", "which", "who", "whom", "whose", "why", "will", "with", "would",
    "you", "your",
];

fn is_content_word(token: &str) -> bool {
    if token.chars().all(char::is_numeric) {
        return true;
    }
    token.chars().count() >= 3 && !STOP_WORDS.contains(&token)
}

fn word_regex() -> &'static Regex {
    static WORDS: OnceLock<Regex> = OnceLock::new();
    WORDS.get_or_init(|| Regex::new(r"\w+").expect("static regex is valid"))
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_sync(t)).collect())
    }

    fn model_id(&self) -> String {
        format!("hashing/{}", self.name)
    }
}
