pub mod hashing;
pub mod provider;
pub mod search;
pub mod store;

pub use provider::{EmbeddingBackend, EmbeddingProvider, EmbeddingSettings};
pub use search::{Retriever, SharedIndex};
pub use store::{ScoredChunk, VectorIndex};

/// Dimension of the all-MiniLM-L6-v2 family and of the hashing embedder.
pub const EMBEDDING_DIM: usize = 384;

/// How entries are scored against a query. Recorded in the index manifest so
/// search always uses the metric the index was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityMetric {
    #[default]
    Cosine,
    /// Scored as negative L2 distance so that higher is still better.
    Euclidean,
}

impl SimilarityMetric {
    pub fn score(&self, query: &[f32], candidate: &[f32]) -> f32 {
        match self {
            SimilarityMetric::Cosine => cosine_similarity(query, candidate),
            SimilarityMetric::Euclidean => -euclidean_distance(query, candidate),
        }
    }
}

impl std::fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimilarityMetric::Cosine => write!(f, "cosine"),
            SimilarityMetric::Euclidean => write!(f, "euclidean"),
        }
    }
}

/// Cosine similarity between two vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
