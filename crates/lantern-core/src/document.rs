//! Document and indexing types

use serde::{Deserialize, Serialize};

/// A unit of source text read at index-build time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub position: usize,
    pub source: String,
    pub content: String,
}

/// Result of an indexing run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingResult {
    pub documents_read: usize,
    pub entries_indexed: usize,
    pub dimension: usize,
    pub embedder: String,
}

/// Characters shared by consecutive chunks when the caller gives no overlap
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Configuration for document indexing
///
/// `chunk_size` of `None` keeps one index entry per document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    pub chunk_size: Option<usize>,
    pub chunk_overlap: usize,
    pub batch_size: usize,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            chunk_size: None,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            batch_size: 32,
        }
    }
}

impl IndexingConfig {
    /// Chunked indexing with `chunk_size` characters per entry
    ///
    /// Without an explicit overlap the default is capped at a fifth of the
    /// chunk size, so small chunks still advance.
    pub fn chunked(chunk_size: usize, chunk_overlap: Option<usize>) -> Self {
        Self {
            chunk_size: Some(chunk_size),
            chunk_overlap: chunk_overlap.unwrap_or_else(|| default_overlap(chunk_size)),
            ..Default::default()
        }
    }
}

fn default_overlap(chunk_size: usize) -> usize {
    DEFAULT_CHUNK_OVERLAP.min(chunk_size / 5)
}
