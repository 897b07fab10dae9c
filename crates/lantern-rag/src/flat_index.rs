//! Exact nearest-neighbor index over squared L2 distance

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use lantern_core::{Error, Result};

/// On-disk format version of the persisted index
pub const INDEX_FORMAT_VERSION: u32 = 1;

/// A search hit: the entry's position in insertion order and its distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

/// Flat (brute-force) vector index
///
/// Entries keep their insertion order, so position `i` in the index always
/// corresponds to position `i` in the text store built alongside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatIndex {
    version: u32,
    embedder: String,
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

/// Squared Euclidean distance between two vectors of equal length
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

impl FlatIndex {
    pub fn new(embedder: impl Into<String>, dimension: usize) -> Self {
        Self {
            version: INDEX_FORMAT_VERSION,
            embedder: embedder.into(),
            dimension,
            vectors: Vec::new(),
        }
    }

    /// Append a vector, returning its position
    pub fn add(&mut self, vector: Vec<f32>) -> Result<usize> {
        if vector.len() != self.dimension {
            return Err(Error::Index(format!(
                "vector has dimension {}, index expects {}",
                vector.len(),
                self.dimension
            )));
        }
        self.vectors.push(vector);
        Ok(self.vectors.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Name of the embedder that produced the vectors
    pub fn embedder(&self) -> &str {
        &self.embedder
    }

    /// Return up to `k` nearest entries, closest first
    ///
    /// Equal distances are ordered by ascending position.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dimension {
            return Err(Error::Index(format!(
                "query has dimension {}, index expects {}",
                query.len(),
                self.dimension
            )));
        }

        let mut neighbors: Vec<Neighbor> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, vector)| Neighbor {
                position,
                distance: squared_l2(query, vector),
            })
            .collect();

        neighbors.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.position.cmp(&b.position))
        });
        neighbors.truncate(k);
        Ok(neighbors)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)?;
        debug!(path = %path.display(), entries = self.len(), "index saved");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Index(format!("cannot read index {}: {}", path.display(), e))
        })?;
        let index: FlatIndex = serde_json::from_str(&raw)
            .map_err(|e| Error::Index(format!("corrupt index {}: {}", path.display(), e)))?;

        if index.version != INDEX_FORMAT_VERSION {
            return Err(Error::Index(format!(
                "unsupported index version {} (expected {})",
                index.version, INDEX_FORMAT_VERSION
            )));
        }
        if let Some(bad) = index.vectors.iter().find(|v| v.len() != index.dimension) {
            return Err(Error::Index(format!(
                "stored vector has dimension {}, index header says {}",
                bad.len(),
                index.dimension
            )));
        }
        Ok(index)
    }
}
