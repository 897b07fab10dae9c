//! Retriever trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Query for top-k retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalQuery {
    pub query: String,
    pub top_k: usize,
}

impl RetrievalQuery {
    pub fn new(query: impl Into<String>, top_k: usize) -> Self {
        Self {
            query: query.into(),
            top_k,
        }
    }
}

impl Default for RetrievalQuery {
    fn default() -> Self {
        Self {
            query: String::new(),
            top_k: 2,
        }
    }
}

/// A text returned by retrieval with its index position and distance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub position: usize,
    pub text: String,
    pub distance: f32,
}

/// Result from retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub documents: Vec<RetrievedDocument>,
    pub context: String,
}

impl RetrievalResult {
    pub fn empty() -> Self {
        Self {
            documents: Vec::new(),
            context: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Trait for retrievers
///
/// A retriever owns an already-loaded index and text store. Retrieval on an
/// empty index returns an empty result rather than an error.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Retrieve the top-k texts closest to the query
    async fn retrieve(&self, query: &RetrievalQuery) -> Result<RetrievalResult>;

    /// Build the context block from retrieved documents
    fn build_context(&self, documents: &[RetrievedDocument]) -> String;

    /// Get statistics about the loaded index
    fn stats(&self) -> serde_json::Value;

    /// Check if the retriever has anything to search
    fn is_ready(&self) -> bool;
}
