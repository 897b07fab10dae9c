//! Building and persisting the index and its text store

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use lantern_core::{Document, Embedder, Error, IndexingConfig, IndexingResult, Result};

use crate::document_loader::chunk_text;
use crate::flat_index::FlatIndex;
use crate::text_store::TextStore;

/// Locations of the persisted index and text store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPaths {
    pub index: PathBuf,
    pub texts: PathBuf,
}

impl IndexPaths {
    pub fn new(index: impl AsRef<Path>, texts: impl AsRef<Path>) -> Self {
        Self {
            index: index.as_ref().to_path_buf(),
            texts: texts.as_ref().to_path_buf(),
        }
    }
}

/// An index and the text store aligned with it
#[derive(Debug, Clone)]
pub struct BuiltIndex {
    pub index: FlatIndex,
    pub store: TextStore,
    pub result: IndexingResult,
}

/// Embeds documents into a [`FlatIndex`] with a matching [`TextStore`]
pub struct IndexBuilder {
    embedder: Arc<dyn Embedder>,
    config: IndexingConfig,
}

impl IndexBuilder {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            config: IndexingConfig::default(),
        }
    }

    pub fn with_config(embedder: Arc<dyn Embedder>, config: IndexingConfig) -> Self {
        Self { embedder, config }
    }

    /// Embed all documents, keeping index and store positions aligned
    pub async fn build(&self, documents: &[Document]) -> Result<BuiltIndex> {
        let mut store = TextStore::new();
        for document in documents {
            match self.config.chunk_size {
                Some(size) => {
                    for chunk in chunk_text(&document.content, size, self.config.chunk_overlap)? {
                        store.push(&chunk);
                    }
                }
                None => {
                    store.push(&document.content);
                }
            }
        }

        let mut index = FlatIndex::new(self.embedder.name(), self.embedder.dimension());
        let texts: Vec<String> = store.iter().map(str::to_string).collect();
        for batch in texts.chunks(self.config.batch_size.max(1)) {
            let vectors = self.embedder.embed(batch).await?;
            if vectors.len() != batch.len() {
                return Err(Error::Embedding(format!(
                    "embedder returned {} vectors for {} texts",
                    vectors.len(),
                    batch.len()
                )));
            }
            for vector in vectors {
                index.add(vector)?;
            }
        }

        let result = IndexingResult {
            documents_read: documents.len(),
            entries_indexed: index.len(),
            dimension: index.dimension(),
            embedder: index.embedder().to_string(),
        };
        Ok(BuiltIndex {
            index,
            store,
            result,
        })
    }

    /// Build, then write the index and text store to `paths`
    pub async fn build_and_persist(
        &self,
        documents: &[Document],
        paths: &IndexPaths,
    ) -> Result<IndexingResult> {
        let built = self.build(documents).await?;
        built.index.save(&paths.index)?;
        built.store.save(&paths.texts)?;

        info!(
            documents = built.result.documents_read,
            entries = built.result.entries_indexed,
            index = %paths.index.display(),
            texts = %paths.texts.display(),
            "index written"
        );
        Ok(built.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::HashingEmbedder;
    use async_trait::async_trait;

    fn document(position: usize, content: &str) -> Document {
        Document {
            position,
            source: format!("doc{}.txt", position),
            content: content.to_string(),
        }
    }

    struct ShortEmbedder;

    #[async_trait]
    impl Embedder for ShortEmbedder {
        fn name(&self) -> &str {
            "short"
        }

        fn dimension(&self) -> usize {
            1
        }

        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![0.0]])
        }
    }

    #[tokio::test]
    async fn test_build_one_entry_per_document() {
        let builder = IndexBuilder::new(Arc::new(HashingEmbedder::new(32).unwrap()));
        let documents = vec![
            document(0, "The first tale.\nIt has two lines."),
            document(1, "The second tale."),
            document(2, "The third tale."),
        ];

        let built = builder.build(&documents).await.unwrap();
        assert_eq!(built.index.len(), 3);
        assert_eq!(built.store.len(), 3);
        assert_eq!(built.store.get(0), Some("The first tale. It has two lines."));
        assert_eq!(built.result.entries_indexed, 3);
        assert_eq!(built.result.embedder, "hashing-md5-32");
    }

    #[tokio::test]
    async fn test_build_with_chunking_and_small_batches() {
        let config = IndexingConfig {
            chunk_size: Some(10),
            chunk_overlap: 2,
            batch_size: 2,
        };
        let builder = IndexBuilder::with_config(Arc::new(HashingEmbedder::new(16).unwrap()), config);
        let documents = vec![document(0, "abcdefghijklmnopqrstuvwxyz")];

        let built = builder.build(&documents).await.unwrap();
        assert_eq!(built.result.documents_read, 1);
        assert_eq!(built.index.len(), built.store.len());
        assert!(built.index.len() > 1);
    }

    #[tokio::test]
    async fn test_build_small_chunks_with_default_overlap() {
        let config = IndexingConfig::chunked(100, None);
        let builder = IndexBuilder::with_config(Arc::new(HashingEmbedder::new(16).unwrap()), config);
        let documents = vec![document(0, &"lantern ".repeat(32)[..250])];

        let built = builder.build(&documents).await.unwrap();
        assert_eq!(built.index.len(), 3);
        assert_eq!(built.store.get(2).map(|t| t.chars().count()), Some(90));
    }

    #[tokio::test]
    async fn test_build_empty_set() {
        let builder = IndexBuilder::new(Arc::new(HashingEmbedder::new(8).unwrap()));
        let built = builder.build(&[]).await.unwrap();
        assert!(built.index.is_empty());
        assert_eq!(built.index.dimension(), 8);
        assert!(built.store.is_empty());
    }

    #[tokio::test]
    async fn test_build_rejects_wrong_vector_count() {
        let builder = IndexBuilder::new(Arc::new(ShortEmbedder));
        let documents = vec![document(0, "one"), document(1, "two")];
        let err = builder.build(&documents).await.unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }
}
