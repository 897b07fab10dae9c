//! Reading source documents and splitting them into chunks

use std::path::Path;
use tracing::{debug, warn};

use lantern_core::{Document, Error, Result};

/// Read every regular, non-hidden file in `dir` as one document
///
/// Files are visited in name order so positions are stable between runs.
/// Subdirectories are ignored and files that are not valid UTF-8 are skipped
/// with a warning.
pub async fn load_documents(dir: &Path) -> Result<Vec<Document>> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
        Error::InvalidInput(format!("cannot read documents directory {}: {}", dir.display(), e))
    })?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        if entry.file_type().await?.is_file() {
            files.push((name, entry.path()));
        }
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let mut documents = Vec::with_capacity(files.len());
    for (name, path) in files {
        let bytes = tokio::fs::read(&path).await?;
        match String::from_utf8(bytes) {
            Ok(content) => documents.push(Document {
                position: documents.len(),
                source: name,
                content,
            }),
            Err(_) => warn!(file = %path.display(), "skipping file that is not valid UTF-8"),
        }
    }

    debug!(dir = %dir.display(), count = documents.len(), "documents loaded");
    Ok(documents)
}

/// Split `content` into windows of `chunk_size` characters overlapping by
/// `chunk_overlap` characters
pub fn chunk_text(content: &str, chunk_size: usize, chunk_overlap: usize) -> Result<Vec<String>> {
    if chunk_size == 0 {
        return Err(Error::InvalidInput("chunk size must be at least 1".to_string()));
    }
    if chunk_overlap >= chunk_size {
        return Err(Error::InvalidInput(format!(
            "chunk overlap ({}) must be smaller than chunk size ({})",
            chunk_overlap, chunk_size
        )));
    }

    let chars: Vec<char> = content.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());

        if end >= chars.len() {
            break;
        }

        start = end - chunk_overlap;
    }

    Ok(chunks)
}
