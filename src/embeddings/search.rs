use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, RwLock};

use tracing::debug;

use super::store::{ScoredChunk, VectorIndex};
use super::EmbeddingProvider;
use crate::error::{NyayError, Result};

/// Swap pointer around the serving index. Readers take a cheap `Arc` clone
/// and search without holding the lock, so a rebuild swapped in with
/// [`SharedIndex::swap`] never exposes a partially-built index.
#[derive(Clone)]
pub struct SharedIndex {
    inner: Arc<RwLock<Arc<VectorIndex>>>,
}

impl SharedIndex {
    pub fn new(index: VectorIndex) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(index))),
        }
    }

    pub fn current(&self) -> Arc<VectorIndex> {
        let guard = self.inner.read().unwrap_or_else(|p| p.into_inner());
        Arc::clone(&guard)
    }

    /// Replace the serving index, returning the previous one.
    pub fn swap(&self, index: VectorIndex) -> Arc<VectorIndex> {
        let mut guard = self.inner.write().unwrap_or_else(|p| p.into_inner());
        std::mem::replace(&mut *guard, Arc::new(index))
    }
}

/// Bounded FIFO cache of query results, keyed by query text and tagged with
/// the fingerprint of the index that produced them.
struct QueryCache {
    capacity: usize,
    entries: HashMap<String, (String, Vec<ScoredChunk>)>,
    order: VecDeque<String>,
}

impl QueryCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn get(&self, query: &str, fingerprint: &str) -> Option<Vec<ScoredChunk>> {
        match self.entries.get(query) {
            Some((fp, results)) if fp == fingerprint => Some(results.clone()),
            _ => None,
        }
    }

    fn put(&mut self, query: &str, fingerprint: &str, results: &[ScoredChunk]) {
        if self.capacity == 0 {
            return;
        }
        if !self.entries.contains_key(query) {
            while self.order.len() >= self.capacity {
                if let Some(oldest) = self.order.pop_front() {
                    self.entries.remove(&oldest);
                }
            }
            self.order.push_back(query.to_string());
        }
        self.entries.insert(
            query.to_string(),
            (fingerprint.to_string(), results.to_vec()),
        );
    }
}

/// Fixed top-k similarity search over the serving index.
pub struct Retriever {
    index: SharedIndex,
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
    cache: Mutex<QueryCache>,
}

impl Retriever {
    pub fn new(
        index: SharedIndex,
        embedder: Arc<dyn EmbeddingProvider>,
        top_k: usize,
        cache_size: usize,
    ) -> Self {
        Self {
            index,
            embedder,
            top_k,
            cache: Mutex::new(QueryCache::new(cache_size)),
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn index(&self) -> &SharedIndex {
        &self.index
    }

    /// Embed `query` and return the `top_k` nearest chunks, best first.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredChunk>> {
        let index = self.index.current();
        let fingerprint = index.fingerprint();

        let cached = self
            .cache
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(query, &fingerprint);
        if let Some(results) = cached {
            debug!(results = results.len(), "query cache hit");
            return Ok(results);
        }

        let vector = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| NyayError::Retrieval(format!("query embedding failed: {}", e)))?;
        let results = index.search(&vector, self.top_k)?;

        self.cache
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .put(query, &fingerprint, &results);

        debug!(
            results = results.len(),
            top_score = ?results.first().map(|r| r.score),
            "retrieved chunks"
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::hashing::HashingEmbedder;
    use crate::embeddings::SimilarityMetric;
    use crate::ingest::Chunk;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEmbedder {
        inner: HashingEmbedder,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingProvider for CountingEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.embed_batch(texts).await
        }

        fn model_id(&self) -> String {
            self.inner.model_id()
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FailingEmbedder {
        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(NyayError::Embedding("connection refused".into()))
        }

        fn model_id(&self) -> String {
            "failing/none".into()
        }
    }

    fn chunk(text: &str) -> Chunk {
        Chunk {
            id: text.to_string(),
            text: text.to_string(),
            source: "act.txt".into(),
            page: None,
            chunk_index: 0,
            start: 0,
        }
    }

    async fn index_of(texts: &[&str]) -> VectorIndex {
        index_with(texts, SimilarityMetric::Cosine).await
    }

    async fn index_with(texts: &[&str], metric: SimilarityMetric) -> VectorIndex {
        let chunks = texts.iter().map(|t| chunk(t)).collect();
        VectorIndex::build(chunks, &HashingEmbedder::default(), metric, 16, |_| {})
            .await
            .unwrap()
    }

    fn counting() -> Arc<CountingEmbedder> {
        Arc::new(CountingEmbedder {
            inner: HashingEmbedder::default(),
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn returns_at_most_top_k() {
        let index = index_of(&["bail", "fir", "divorce", "property", "consumer"]).await;
        let retriever = Retriever::new(SharedIndex::new(index), counting(), 4, 0);
        assert_eq!(retriever.retrieve("bail").await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn repeated_query_hits_cache() {
        let embedder = counting();
        let index = index_of(&["bail application", "fir registration"]).await;
        let retriever = Retriever::new(SharedIndex::new(index), embedder.clone(), 2, 8);

        let first = retriever.retrieve("how to get bail").await.unwrap();
        let second = retriever.retrieve("how to get bail").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn swapped_index_invalidates_cache() {
        let embedder = counting();
        let shared = SharedIndex::new(index_of(&["old bail rules"]).await);
        let retriever = Retriever::new(shared.clone(), embedder.clone(), 1, 8);

        let before = retriever.retrieve("bail").await.unwrap();
        assert_eq!(before[0].chunk.text, "old bail rules");

        shared.swap(index_of(&["new bail rules"]).await);
        let after = retriever.retrieve("bail").await.unwrap();
        assert_eq!(after[0].chunk.text, "new bail rules");
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn metric_change_invalidates_cache() {
        let texts = ["bail application", "fir registration"];
        let embedder = counting();
        let shared = SharedIndex::new(index_of(&texts).await);
        let retriever = Retriever::new(shared.clone(), embedder.clone(), 1, 8);

        let cosine = retriever.retrieve("bail").await.unwrap();
        let old = shared.swap(index_with(&texts, SimilarityMetric::Euclidean).await);
        assert_eq!(old.manifest().checksum, shared.current().manifest().checksum);

        let euclidean = retriever.retrieve("bail").await.unwrap();
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
        assert!(cosine[0].score > 0.0);
        assert!(euclidean[0].score <= 0.0);
    }

    #[tokio::test]
    async fn disabled_cache_always_embeds() {
        let embedder = counting();
        let retriever = Retriever::new(
            SharedIndex::new(index_of(&["x"]).await),
            embedder.clone(),
            1,
            0,
        );
        retriever.retrieve("x").await.unwrap();
        retriever.retrieve("x").await.unwrap();
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn embedding_failure_is_retrieval_error() {
        let retriever = Retriever::new(
            SharedIndex::new(index_of(&["x"]).await),
            Arc::new(FailingEmbedder),
            1,
            0,
        );
        let err = retriever.retrieve("x").await.unwrap_err();
        assert!(matches!(err, NyayError::Retrieval(_)));
    }

    #[test]
    fn cache_evicts_oldest_entry() {
        let mut cache = QueryCache::new(2);
        cache.put("a", "fp", &[]);
        cache.put("b", "fp", &[]);
        cache.put("c", "fp", &[]);
        assert!(cache.get("a", "fp").is_none());
        assert!(cache.get("b", "fp").is_some());
        assert!(cache.get("c", "fp").is_some());
        assert!(cache.get("c", "other").is_none());
    }
}
