//! Embedder implementations

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

use lantern_core::{Embedder, Error, Result};

use crate::config::{EmbedderKind, RagConfig};
use crate::onnx_embedder::OnnxEmbedder;

/// Deterministic offline embedder based on feature hashing
///
/// Each lowercase word token and each adjacent word pair is hashed into one
/// of `dimension` buckets with a pseudo-random sign. The resulting vector is
/// L2-normalized, so squared L2 distance between two vectors ranks the same
/// way cosine similarity does. Identical texts always embed identically.
pub struct HashingEmbedder {
    name: String,
    dimension: usize,
    token_pattern: Regex,
}

impl HashingEmbedder {
    pub const DEFAULT_DIMENSION: usize = 384;
    const BIGRAM_WEIGHT: f32 = 0.5;

    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(Error::Configuration(
                "embedding dimension must be at least 1".to_string(),
            ));
        }
        let token_pattern = Regex::new(r"[\p{L}\p{N}]+")
            .map_err(|e| Error::Configuration(format!("invalid token pattern: {}", e)))?;

        Ok(Self {
            name: format!("hashing-md5-{}", dimension),
            dimension,
            token_pattern,
        })
    }

    /// Embed one text synchronously
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = self
            .token_pattern
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .collect();

        let mut vector = vec![0.0f32; self.dimension];
        for token in &tokens {
            self.accumulate(&mut vector, token, 1.0);
        }
        for pair in tokens.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            self.accumulate(&mut vector, &bigram, Self::BIGRAM_WEIGHT);
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }

    fn accumulate(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let digest = md5::compute(feature.as_bytes()).0;
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        let bucket = (u64::from_le_bytes(head) % self.dimension as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

/// Embedder backed by an OpenAI-compatible `/embeddings` endpoint
pub struct RemoteEmbedder {
    name: String,
    model: String,
    dimension: usize,
    endpoint: Url,
    api_key: Option<String>,
    client: Client,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

impl RemoteEmbedder {
    const DEFAULT_MODEL: &'static str = "text-embedding-3-small";
    const TIMEOUT_SECS: u64 = 30;

    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        dimension: usize,
        api_key: Option<String>,
    ) -> Result<Self> {
        let base = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| Error::Configuration(format!("invalid embedding URL: {}", e)))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::Configuration(format!(
                "embedding URL must be http or https: {}",
                base_url
            )));
        }
        let endpoint = Url::parse(&format!("{}/embeddings", base.as_str().trim_end_matches('/')))
            .map_err(|e| Error::Configuration(format!("invalid embedding URL: {}", e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(Self::TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        let model = model.into();
        Ok(Self {
            name: format!("remote:{}", model),
            model,
            dimension,
            endpoint,
            api_key,
            client,
        })
    }

    fn check_vectors(&self, expected: usize, mut data: Vec<EmbeddingData>) -> Result<Vec<Vec<f32>>> {
        if data.len() != expected {
            return Err(Error::Embedding(format!(
                "expected {} embeddings, got {}",
                expected,
                data.len()
            )));
        }
        data.sort_by_key(|d| d.index);

        let vectors: Vec<Vec<f32>> = data.into_iter().map(|d| d.embedding).collect();
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(Error::Embedding(format!(
                "expected dimension {}, got {}",
                self.dimension,
                bad.len()
            )));
        }
        Ok(vectors)
    }
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut request = self.client.post(self.endpoint.clone()).json(&EmbeddingRequest {
            model: &self.model,
            input: texts,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(e.to_string())
            } else {
                Error::Network(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbeddingResponse = serde_json::from_str(&body)?;
        debug!(count = parsed.data.len(), model = %self.model, "embeddings received");
        self.check_vectors(texts.len(), parsed.data)
    }
}

/// Build the embedder selected by configuration
pub fn embedder_from_config(config: &RagConfig) -> Result<Arc<dyn Embedder>> {
    match config.embedder {
        EmbedderKind::Onnx => Ok(Arc::new(OnnxEmbedder::load(
            &config.embedding_model_dir,
            config.embedding_dim,
        )?)),
        EmbedderKind::Hashing => Ok(Arc::new(HashingEmbedder::new(config.embedding_dim)?)),
        EmbedderKind::Remote => {
            let url = config.embedding_url.as_deref().ok_or_else(|| {
                Error::Configuration("remote embedder requires an embedding URL".to_string())
            })?;
            let model = config
                .embedding_model
                .clone()
                .unwrap_or_else(|| RemoteEmbedder::DEFAULT_MODEL.to_string());
            Ok(Arc::new(RemoteEmbedder::new(
                url,
                model,
                config.embedding_dim,
                config.embedding_api_key.clone(),
            )?))
        }
    }
}
