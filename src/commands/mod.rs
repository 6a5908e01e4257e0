pub mod ask;
pub mod chat;
pub mod ingest;
pub mod search;
pub mod stats;

use crate::error::{NyayError, Result};

/// Single-threaded runtime for one CLI invocation.
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| NyayError::Configuration(format!("tokio runtime: {}", e)))
}

/// First `max_chars` characters of `text` on one line.
pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{}...", cut.trim_end())
    }
}
