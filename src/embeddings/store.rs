use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::{EmbeddingProvider, SimilarityMetric};
use crate::error::{NyayError, Result};
use crate::ingest::Chunk;

/// On-disk format version written to the manifest.
pub const FORMAT_VERSION: u32 = 1;
const MANIFEST_FILE: &str = "manifest.json";

/// A chunk together with its embedding
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    pub embedding_model: String,
    pub dimensions: usize,
    pub metric: SimilarityMetric,
    pub chunk_count: usize,
    pub document_count: usize,
    pub built_at: DateTime<Utc>,
    /// SHA-256 of the entries file
    pub checksum: String,
    pub entries_file: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub score: f32,
    pub chunk: Chunk,
}

/// Brute-force vector index. Read-only once built; rebuilding produces a new
/// value that is swapped in through [`super::SharedIndex`].
#[derive(Debug, Clone)]
pub struct VectorIndex {
    manifest: Manifest,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Embed `chunks` in batches of `batch_size` and assemble an index.
    ///
    /// `on_batch` is called with the number of chunks embedded so far.
    pub async fn build(
        chunks: Vec<Chunk>,
        provider: &dyn EmbeddingProvider,
        metric: SimilarityMetric,
        batch_size: usize,
        mut on_batch: impl FnMut(usize),
    ) -> Result<Self> {
        if chunks.is_empty() {
            return Err(NyayError::EmptyCorpus);
        }

        let batch_size = batch_size.max(1);
        let mut entries = Vec::with_capacity(chunks.len());
        let mut dimensions = None;

        for (batch_no, batch) in chunks.chunks(batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = provider.embed_batch(&texts).await.map_err(|e| {
                NyayError::Ingestion(format!("embedding batch {} failed: {}", batch_no, e))
            })?;

            if vectors.len() != batch.len() {
                return Err(NyayError::Ingestion(format!(
                    "embedding provider returned {} vectors for {} chunks",
                    vectors.len(),
                    batch.len()
                )));
            }

            for (chunk, embedding) in batch.iter().zip(vectors) {
                let expected = *dimensions.get_or_insert(embedding.len());
                if embedding.is_empty() || embedding.len() != expected {
                    return Err(NyayError::Ingestion(format!(
                        "inconsistent embedding dimension for chunk {} ({} vs {})",
                        chunk.id,
                        embedding.len(),
                        expected
                    )));
                }
                entries.push(IndexEntry {
                    chunk: chunk.clone(),
                    embedding,
                });
            }

            debug!(batch = batch_no, embedded = entries.len(), "embedded batch");
            on_batch(entries.len());
        }

        let document_count = count_documents(&entries);
        let checksum = checksum(&serde_json::to_vec(&entries)?);

        Ok(Self {
            manifest: Manifest {
                format_version: FORMAT_VERSION,
                embedding_model: provider.model_id(),
                dimensions: dimensions.unwrap_or(0),
                metric,
                chunk_count: entries.len(),
                document_count,
                built_at: Utc::now(),
                entries_file: entries_file_name(&checksum),
                checksum,
            },
            entries,
        })
    }

    /// Persist to `dir`. The manifest rename is the commit point: a reader
    /// opening `dir` sees either the previous index or this one in full.
    ///
    /// The entries file of the previous generation is kept, so a reader that
    /// read the old manifest just before the rename can still load it. Older
    /// generations are removed.
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        let previous = std::fs::read_to_string(dir.join(MANIFEST_FILE))
            .ok()
            .and_then(|text| serde_json::from_str::<Manifest>(&text).ok())
            .map(|manifest| manifest.entries_file);

        let entries_json = serde_json::to_vec(&self.entries)?;
        let entries_path = dir.join(&self.manifest.entries_file);
        let entries_tmp = dir.join(format!("{}.tmp", self.manifest.entries_file));
        std::fs::write(&entries_tmp, &entries_json)?;
        std::fs::rename(&entries_tmp, &entries_path)?;

        let manifest_tmp = dir.join(format!("{}.tmp", MANIFEST_FILE));
        std::fs::write(&manifest_tmp, serde_json::to_string_pretty(&self.manifest)?)?;
        std::fs::rename(&manifest_tmp, dir.join(MANIFEST_FILE))?;

        for stale in std::fs::read_dir(dir)?.filter_map(|e| e.ok()) {
            let name = stale.file_name().to_string_lossy().to_string();
            let keep =
                name == self.manifest.entries_file || previous.as_deref() == Some(name.as_str());
            if name.starts_with("entries-") && !keep {
                if let Err(e) = std::fs::remove_file(stale.path()) {
                    debug!(file = %name, error = %e, "could not remove stale entries file");
                }
            }
        }

        info!(
            path = %dir.display(),
            chunks = self.manifest.chunk_count,
            "saved vector index"
        );
        Ok(())
    }

    /// Load an index written by [`VectorIndex::save`].
    pub fn open(dir: &Path) -> Result<Self> {
        let manifest_path = dir.join(MANIFEST_FILE);
        if !manifest_path.exists() {
            return Err(NyayError::index_load(
                dir,
                "no manifest.json found; run `nyaysetu ingest` first",
            ));
        }

        let manifest_text = std::fs::read_to_string(&manifest_path)
            .map_err(|e| NyayError::index_load(dir, format!("unreadable manifest: {}", e)))?;
        let manifest: Manifest = serde_json::from_str(&manifest_text)
            .map_err(|e| NyayError::index_load(dir, format!("corrupt manifest: {}", e)))?;

        if manifest.format_version != FORMAT_VERSION {
            return Err(NyayError::index_load(
                dir,
                format!("unsupported format version {}", manifest.format_version),
            ));
        }

        let entries_path: PathBuf = dir.join(&manifest.entries_file);
        let raw = std::fs::read(&entries_path).map_err(|e| {
            NyayError::index_load(dir, format!("missing entries file {}: {}", manifest.entries_file, e))
        })?;
        if checksum(&raw) != manifest.checksum {
            return Err(NyayError::index_load(dir, "checksum mismatch; the index is corrupt"));
        }

        let entries: Vec<IndexEntry> = serde_json::from_slice(&raw)
            .map_err(|e| NyayError::index_load(dir, format!("corrupt entries: {}", e)))?;

        if entries.len() != manifest.chunk_count {
            return Err(NyayError::index_load(
                dir,
                format!(
                    "manifest lists {} chunks but {} were found",
                    manifest.chunk_count,
                    entries.len()
                ),
            ));
        }
        if entries.is_empty() {
            return Err(NyayError::index_load(dir, "index contains no entries"));
        }
        if let Some(bad) = entries.iter().find(|e| e.embedding.len() != manifest.dimensions) {
            return Err(NyayError::index_load(
                dir,
                format!("entry {} has the wrong dimension", bad.chunk.id),
            ));
        }

        debug!(path = %dir.display(), chunks = entries.len(), "opened vector index");
        Ok(Self { manifest, entries })
    }

    /// The `top_k` entries most similar to `query`, best first. Equal scores
    /// keep insertion order.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        if query.len() != self.manifest.dimensions {
            return Err(NyayError::Retrieval(format!(
                "query vector has {} dimensions, index expects {}",
                query.len(),
                self.manifest.dimensions
            )));
        }

        let metric = self.manifest.metric;
        let mut results: Vec<(f32, &IndexEntry)> = self
            .entries
            .iter()
            .map(|entry| {
                let score = metric.score(query, &entry.embedding);
                // NaN sorts last; -0.0 and 0.0 must tie.
                let score = if score.is_nan() {
                    f32::NEG_INFINITY
                } else if score == 0.0 {
                    0.0
                } else {
                    score
                };
                (score, entry)
            })
            .collect();

        // Stable sort keeps insertion order for ties.
        results.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(results
            .into_iter()
            .take(top_k)
            .map(|(score, entry)| ScoredChunk {
                score,
                chunk: entry.chunk.clone(),
            })
            .collect())
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Changes whenever the indexed content or the scoring metric changes.
    pub fn fingerprint(&self) -> String {
        format!("{}:{}", self.manifest.metric, self.manifest.checksum)
    }

    pub fn stats(&self) -> IndexStats {
        let mut by_source = BTreeMap::new();
        for entry in &self.entries {
            *by_source.entry(entry.chunk.source.clone()).or_insert(0) += 1;
        }
        IndexStats {
            total_chunks: self.entries.len(),
            documents: self.manifest.document_count,
            by_source,
        }
    }
}

pub struct IndexStats {
    pub total_chunks: usize,
    pub documents: usize,
    pub by_source: BTreeMap<String, usize>,
}

fn count_documents(entries: &[IndexEntry]) -> usize {
    let mut documents: Vec<(&str, Option<u32>)> = entries
        .iter()
        .map(|e| (e.chunk.source.as_str(), e.chunk.page))
        .collect();
    documents.sort();
    documents.dedup();
    documents.len()
}

fn checksum(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn entries_file_name(checksum: &str) -> String {
    format!("entries-{}.json", &checksum[..16])
}
