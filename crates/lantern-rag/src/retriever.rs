//! Retriever over a loaded flat index and text store

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

use lantern_core::{
    Embedder, Error, Result, RetrievalQuery, RetrievalResult, RetrievedDocument, Retriever,
};

use crate::flat_index::FlatIndex;
use crate::index_builder::{BuiltIndex, IndexPaths};
use crate::text_store::TextStore;

/// Local retriever holding the index, the text store and the query embedder
pub struct LocalRetriever {
    index: FlatIndex,
    store: TextStore,
    embedder: Arc<dyn Embedder>,
}

impl LocalRetriever {
    /// Create a retriever, checking that all three parts belong together
    pub fn new(index: FlatIndex, store: TextStore, embedder: Arc<dyn Embedder>) -> Result<Self> {
        if index.len() != store.len() {
            return Err(Error::Misaligned {
                vectors: index.len(),
                texts: store.len(),
            });
        }
        if index.embedder() != embedder.name() {
            return Err(Error::Index(format!(
                "index was built with embedder '{}', but '{}' is configured",
                index.embedder(),
                embedder.name()
            )));
        }
        if index.dimension() != embedder.dimension() {
            return Err(Error::Index(format!(
                "index has dimension {}, embedder produces {}",
                index.dimension(),
                embedder.dimension()
            )));
        }

        Ok(Self {
            index,
            store,
            embedder,
        })
    }

    /// Load the persisted index and text store from `paths`
    pub fn load(paths: &IndexPaths, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let index = FlatIndex::load(&paths.index)?;
        let store = TextStore::load(&paths.texts)?;
        debug!(entries = index.len(), embedder = %index.embedder(), "index loaded");
        Self::new(index, store, embedder)
    }

    /// Wrap a freshly built index
    pub fn from_built(built: BuiltIndex, embedder: Arc<dyn Embedder>) -> Result<Self> {
        Self::new(built.index, built.store, embedder)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[async_trait]
impl Retriever for LocalRetriever {
    async fn retrieve(&self, query: &RetrievalQuery) -> Result<RetrievalResult> {
        if self.index.is_empty() || query.top_k == 0 {
            return Ok(RetrievalResult::empty());
        }

        let vector = match self.embedder.embed_one(&query.query).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!(error = %e, "query embedding failed, continuing without context");
                return Ok(RetrievalResult::empty());
            }
        };

        let neighbors = match self.index.search(&vector, query.top_k) {
            Ok(neighbors) => neighbors,
            Err(e) => {
                warn!(error = %e, "index search failed, continuing without context");
                return Ok(RetrievalResult::empty());
            }
        };

        let documents: Vec<RetrievedDocument> = neighbors
            .into_iter()
            .filter_map(|n| {
                self.store.get(n.position).map(|text| RetrievedDocument {
                    position: n.position,
                    text: text.to_string(),
                    distance: n.distance,
                })
            })
            .collect();

        let context = self.build_context(&documents);
        Ok(RetrievalResult { documents, context })
    }

    fn build_context(&self, documents: &[RetrievedDocument]) -> String {
        documents
            .iter()
            .map(|d| d.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn stats(&self) -> serde_json::Value {
        json!({
            "entries": self.index.len(),
            "dimension": self.index.dimension(),
            "embedder": self.index.embedder(),
        })
    }

    fn is_ready(&self) -> bool {
        !self.index.is_empty()
    }
}
