use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use super::discovery::{DocumentKind, SourceFile};
use super::Document;
use crate::error::{NyayError, Result};

/// Load one source file into Documents: one per PDF page with text, or one
/// for a plain-text file. A readable file without text yields no Documents.
pub fn load_file(file: &SourceFile) -> Result<Vec<Document>> {
    let documents = match file.kind {
        DocumentKind::Pdf => load_pdf(&file.path, &file.name)?,
        DocumentKind::Text => {
            let text = std::fs::read_to_string(&file.path).map_err(|e| {
                NyayError::Ingestion(format!("Failed to read {}: {}", file.name, e))
            })?;
            let text = text.trim_start_matches('\u{FEFF}').to_string();
            if text.trim().is_empty() {
                Vec::new()
            } else {
                vec![Document {
                    source: file.name.clone(),
                    text,
                    page: None,
                }]
            }
        }
    };

    if documents.is_empty() {
        warn!(source = %file.name, "no extractable text, nothing to index");
    }

    Ok(documents)
}

fn load_pdf(path: &Path, name: &str) -> Result<Vec<Document>> {
    let doc = lopdf::Document::load(path)
        .map_err(|e| NyayError::Ingestion(format!("Failed to load PDF {}: {}", name, e)))?;

    let pages = doc.get_pages();
    debug!(source = name, page_count = pages.len(), "extracting text from PDF");

    let mut documents = Vec::new();
    for &page_num in pages.keys() {
        match doc.extract_text(&[page_num]) {
            Ok(raw) => {
                let text = clean_text(&raw);
                if !text.trim().is_empty() {
                    documents.push(Document {
                        source: name.to_string(),
                        text,
                        page: Some(page_num),
                    });
                }
            }
            Err(e) => {
                warn!(source = name, page = page_num, error = %e, "failed to extract page text, skipping page");
            }
        }
    }

    Ok(documents)
}

fn inline_whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t\u{00A0}]+").expect("static regex is valid"))
}

fn blank_lines() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n+").expect("static regex is valid"))
}

/// Normalise extracted PDF text: drop BOM and NUL artifacts, collapse runs of
/// inline whitespace, keep single paragraph breaks.
pub fn clean_text(text: &str) -> String {
    let text = text.replace(['\u{FEFF}', '\0'], "").replace("\r\n", "\n");
    let text = inline_whitespace().replace_all(&text, " ");
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    let joined = lines.join("\n");
    blank_lines()
        .replace_all(&joined, "\n\n")
        .trim()
        .to_string()
}
