pub mod discovery;
pub mod loader;
pub mod splitter;

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::embeddings::{EmbeddingProvider, SimilarityMetric, VectorIndex};
use crate::error::{NyayError, Result};
pub use discovery::SourceFile;
pub use splitter::RecursiveSplitter;

/// Raw source unit: a whole text file or a single PDF page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Basename of the originating file
    pub source: String,
    pub text: String,
    /// 1-based page number for PDFs
    pub page: Option<u32>,
}

/// A contiguous slice of one Document's text; the atomic retrieval unit.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Position of this chunk within its Document
    pub chunk_index: usize,
    /// Character offset of the chunk within its Document
    pub start: usize,
}

#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Everything produced by one ingestion pass, before embedding.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub files: usize,
    pub documents: usize,
    pub chunks: Vec<Chunk>,
    pub skipped: Vec<SkippedFile>,
}

/// Split one Document into Chunks.
pub fn split_document(document: &Document, splitter: &RecursiveSplitter) -> Vec<Chunk> {
    splitter
        .split(&document.text)
        .into_iter()
        .enumerate()
        .map(|(chunk_index, span)| Chunk {
            id: chunk_id(&document.source, document.page, chunk_index, span.text),
            text: span.text.to_string(),
            source: document.source.clone(),
            page: document.page,
            chunk_index,
            start: span.char_start,
        })
        .collect()
}

/// Load `files` in parallel, keeping discovery order.
///
/// A file that cannot be read or parsed is skipped and reported. Fails only
/// when every file failed; readable files without text are not failures.
pub fn load_documents(files: &[SourceFile]) -> Result<(Vec<Document>, Vec<SkippedFile>)> {
    let loaded: Vec<Result<Vec<Document>>> = files.par_iter().map(loader::load_file).collect();

    let mut documents = Vec::new();
    let mut skipped = Vec::new();
    let mut seen_sources: Vec<&str> = Vec::new();

    for (file, result) in files.iter().zip(loaded) {
        match result {
            Ok(docs) => {
                if seen_sources.contains(&file.name.as_str()) {
                    warn!(source = %file.name, "another file with the same name was already ingested");
                }
                seen_sources.push(&file.name);
                documents.extend(docs);
            }
            Err(e) => {
                warn!(path = %file.path.display(), error = %e, "skipping unreadable document");
                skipped.push(SkippedFile {
                    path: file.path.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if !files.is_empty() && skipped.len() == files.len() {
        return Err(NyayError::Ingestion(format!(
            "None of the {} source files could be loaded",
            files.len()
        )));
    }
    Ok((documents, skipped))
}

/// Load every supported document under `dir` and split it.
pub fn load_corpus(dir: &Path, splitter: &RecursiveSplitter) -> Result<Corpus> {
    let discovery::Discovery {
        files,
        skipped: unreadable,
    } = discovery::discover_documents(dir)?;
    info!(dir = %dir.display(), files = files.len(), "discovered source documents");

    let (documents, unloadable) = load_documents(&files)?;
    let skipped: Vec<SkippedFile> = unreadable.into_iter().chain(unloadable).collect();
    let chunks: Vec<Chunk> = documents
        .iter()
        .flat_map(|document| split_document(document, splitter))
        .collect();

    info!(
        documents = documents.len(),
        chunks = chunks.len(),
        skipped = skipped.len(),
        "split documents into chunks"
    );

    Ok(Corpus {
        files: files.len(),
        documents: documents.len(),
        chunks,
        skipped,
    })
}

/// Outcome of a full ingestion pass.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub files: usize,
    pub documents: usize,
    pub chunks: usize,
    pub skipped: Vec<SkippedFile>,
    pub embedding_model: String,
    pub index_path: PathBuf,
}

/// Load, split, embed and persist. Nothing is written unless every step
/// before the save succeeded.
///
/// `on_progress` receives `(embedded_so_far, total_chunks)`.
pub async fn ingest(
    source_dir: &Path,
    index_path: &Path,
    splitter: &RecursiveSplitter,
    provider: &dyn EmbeddingProvider,
    metric: SimilarityMetric,
    batch_size: usize,
    mut on_progress: impl FnMut(usize, usize),
) -> Result<IngestReport> {
    let corpus = load_corpus(source_dir, splitter)?;
    let total = corpus.chunks.len();
    let chunks = corpus.chunks;

    let index = VectorIndex::build(chunks, provider, metric, batch_size, |done| {
        on_progress(done, total)
    })
    .await?;
    index.save(index_path)?;

    Ok(IngestReport {
        files: corpus.files,
        documents: corpus.documents,
        chunks: index.len(),
        skipped: corpus.skipped,
        embedding_model: index.manifest().embedding_model.clone(),
        index_path: index_path.to_path_buf(),
    })
}

fn chunk_id(source: &str, page: Option<u32>, index: usize, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(page.unwrap_or(0).to_le_bytes());
    hasher.update(index.to_le_bytes());
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())[..16].to_string()
}
