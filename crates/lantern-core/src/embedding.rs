//! Embedder trait

use async_trait::async_trait;

use crate::Result;

/// Trait for text embedding models
///
/// The same embedder must be used at index-build time and at query time: the
/// name and dimension are persisted with the index and checked when it is loaded.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable identifier written into the persisted index
    fn name(&self) -> &str;

    /// Length of every vector this embedder produces
    fn dimension(&self) -> usize;

    /// Embed a batch of texts, one vector per input, in input order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| crate::Error::Embedding("embedder returned no vector".to_string()))
    }
}
