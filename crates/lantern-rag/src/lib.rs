//! Retrieval for Lantern
//!
//! This crate provides the embedders (a local pretrained sentence encoder,
//! an offline hashing fallback and a remote endpoint client), the flat
//! nearest-neighbor index, the delimiter-separated text store, the index
//! builder, the retriever and the prompt composer used by the answering
//! pipeline.

mod config;
mod document_loader;
mod embedder;
mod flat_index;
mod index_builder;
mod onnx_embedder;
mod prompt;
mod retriever;
mod text_store;

#[cfg(test)]
mod tests;

pub use config::{EmbedderKind, RagConfig};
pub use document_loader::{chunk_text, load_documents};
pub use embedder::{HashingEmbedder, RemoteEmbedder, embedder_from_config};
pub use flat_index::{FlatIndex, Neighbor, squared_l2};
pub use index_builder::{BuiltIndex, IndexBuilder, IndexPaths};
pub use onnx_embedder::OnnxEmbedder;
pub use prompt::{PromptComposer, SYSTEM_PROMPT};
pub use retriever::LocalRetriever;
pub use text_store::{DELIMITER, TextStore};

// Re-export core types for convenience
pub use lantern_core::{
    Document, Embedder, Error, IndexingConfig, IndexingResult, Result, RetrievalQuery,
    RetrievalResult, RetrievedDocument, Retriever,
};
