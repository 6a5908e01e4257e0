use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use super::SkippedFile;
use crate::error::{NyayError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Text,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "txt" | "md" => Some(DocumentKind::Text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Full path, used only for reading; never stored in the index.
    pub path: PathBuf,
    /// Basename recorded as chunk provenance.
    pub name: String,
    pub kind: DocumentKind,
}

/// Supported documents found under a directory, plus the entries the walk
/// could not read.
#[derive(Debug, Default)]
pub struct Discovery {
    pub files: Vec<SourceFile>,
    pub skipped: Vec<SkippedFile>,
}

/// Find every supported document under `dir`, sorted by path so repeated
/// ingestion of the same directory yields the same order.
///
/// Symlinks are followed. Broken links and unreadable directories are
/// logged and reported in [`Discovery::skipped`].
pub fn discover_documents(dir: &Path) -> Result<Discovery> {
    if !dir.exists() {
        return Err(NyayError::Ingestion(format!(
            "Source directory not found: {}",
            dir.display()
        )));
    }
    if !dir.is_dir() {
        return Err(NyayError::Ingestion(format!(
            "Source path is not a directory: {}",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    let mut skipped = Vec::new();

    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().unwrap_or(dir).to_path_buf();
                warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                skipped.push(SkippedFile {
                    path,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let Some(kind) = DocumentKind::from_path(path) else {
            debug!(path = %path.display(), "ignoring unsupported file");
            continue;
        };

        files.push(SourceFile {
            path: path.to_path_buf(),
            name: source_name(path, dir),
            kind,
        });
    }

    if files.is_empty() {
        return Err(NyayError::Ingestion(format!(
            "No supported documents (.pdf, .txt, .md) in {}",
            dir.display()
        )));
    }

    Ok(Discovery { files, skipped })
}

/// Basename of `path`; falls back to the source directory's own name.
pub fn source_name(path: &Path, dir: &Path) -> String {
    path.file_name()
        .or_else(|| dir.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_directory_is_ingestion_error() {
        let err = discover_documents(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, NyayError::Ingestion(_)));
    }

    #[test]
    fn directory_without_documents_is_ingestion_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("notes.docx"), "binary").unwrap();
        let err = discover_documents(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("No supported documents"));
    }

    #[test]
    fn finds_nested_files_sorted_with_basenames() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("ipc").join("chapter17");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("section420.txt"), "cheating").unwrap();
        std::fs::write(tmp.path().join("article21.md"), "life").unwrap();
        std::fs::write(tmp.path().join("readme.json"), "{}").unwrap();

        let files = discover_documents(tmp.path()).unwrap().files;
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["article21.md", "section420.txt"]);
        assert!(files.iter().all(|f| !f.name.contains('/')));
        assert_eq!(files[1].kind, DocumentKind::Text);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_reported_as_skipped() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("ipc.txt"), "Section 420").unwrap();
        std::os::unix::fs::symlink(tmp.path().join("gone.pdf"), tmp.path().join("x.pdf")).unwrap();

        let found = discover_documents(tmp.path()).unwrap();
        assert_eq!(found.files.len(), 1);
        assert_eq!(found.files[0].name, "ipc.txt");
        assert_eq!(found.skipped.len(), 1);
        assert!(found.skipped[0].path.ends_with("x.pdf"));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_document_is_followed() {
        let tmp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        std::fs::write(outside.path().join("crpc.md"), "FIR").unwrap();
        std::os::unix::fs::symlink(outside.path().join("crpc.md"), tmp.path().join("crpc.md")).unwrap();

        let found = discover_documents(tmp.path()).unwrap();
        assert_eq!(found.files.len(), 1);
        assert_eq!(found.files[0].name, "crpc.md");
        assert!(found.skipped.is_empty());
    }

    #[test]
    fn kind_is_case_insensitive() {
        assert_eq!(
            DocumentKind::from_path(Path::new("IPC.PDF")),
            Some(DocumentKind::Pdf)
        );
        assert_eq!(DocumentKind::from_path(Path::new("noext")), None);
    }
}
