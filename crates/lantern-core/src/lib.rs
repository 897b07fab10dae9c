//! Core traits and types for Lantern
//!
//! This crate defines the fundamental traits and types shared by the Lantern crates.
//! It provides capability-facing interfaces for completion providers, embedders and
//! retrievers, so the answering pipeline can be assembled from injected parts and
//! tested without a network.

pub mod document;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod rag;
pub mod types;

pub use document::{DEFAULT_CHUNK_OVERLAP, Document, IndexingConfig, IndexingResult};
pub use embedding::Embedder;
pub use error::{Error, Result};
pub use llm::{ChatMessage, CompletionProvider, GenerationConfig, GenerationResult, Role};
pub use rag::{RetrievalQuery, RetrievalResult, RetrievedDocument, Retriever};
pub use types::*;
