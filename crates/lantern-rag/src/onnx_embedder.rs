//! Local sentence-embedding model run through tract
//!
//! Loads a BERT-style sentence encoder (all-MiniLM-L6-v2 by default) exported
//! to ONNX together with its `tokenizer.json`, and produces mean-pooled,
//! L2-normalized sentence vectors.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokenizers::Tokenizer;
use tracing::debug;
use tract_onnx::prelude::*;

use lantern_core::{Embedder, Error, Result};

type TractPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Token ids, attention mask and segment ids of one encoded text
#[derive(Debug, Clone, PartialEq)]
struct EncodedText {
    input_ids: Vec<i64>,
    attention_mask: Vec<i64>,
    token_type_ids: Vec<i64>,
}

struct OnnxModel {
    plan: TractPlan,
    tokenizer: Tokenizer,
    input_count: usize,
    dimension: usize,
    max_length: usize,
}

/// Pretrained sentence encoder evaluated locally on the CPU
pub struct OnnxEmbedder {
    name: String,
    model: Arc<OnnxModel>,
}

impl OnnxEmbedder {
    pub const DEFAULT_MODEL_DIR: &'static str = "models/all-MiniLM-L6-v2";
    pub const MODEL_FILE: &'static str = "model.onnx";
    pub const TOKENIZER_FILE: &'static str = "tokenizer.json";
    /// Longest token sequence all-MiniLM-L6-v2 was trained on
    pub const MAX_LENGTH: usize = 256;

    /// Load `model.onnx` and `tokenizer.json` from `model_dir`
    pub fn load(model_dir: &Path, dimension: usize) -> Result<Self> {
        let (model_path, tokenizer_path) = model_files(model_dir)?;

        let plan = tract_onnx::onnx()
            .model_for_path(&model_path)
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| {
                Error::Configuration(format!("failed to load {}: {}", model_path.display(), e))
            })?;
        let input_count = plan.model().inputs.len();
        if !(1..=3).contains(&input_count) {
            return Err(Error::Configuration(format!(
                "{} has {} inputs, expected a BERT-style encoder",
                model_path.display(),
                input_count
            )));
        }

        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            Error::Configuration(format!("failed to load {}: {}", tokenizer_path.display(), e))
        })?;

        let name = model_dir
            .file_name()
            .map(|n| format!("onnx:{}", n.to_string_lossy()))
            .unwrap_or_else(|| "onnx".to_string());
        debug!(model = %model_path.display(), inputs = input_count, "sentence encoder loaded");

        Ok(Self {
            name,
            model: Arc::new(OnnxModel {
                plan,
                tokenizer,
                input_count,
                dimension,
                max_length: Self::MAX_LENGTH,
            }),
        })
    }
}

/// Resolve the model and tokenizer files, failing when either is missing
fn model_files(model_dir: &Path) -> Result<(PathBuf, PathBuf)> {
    let model_path = model_dir.join(OnnxEmbedder::MODEL_FILE);
    let tokenizer_path = model_dir.join(OnnxEmbedder::TOKENIZER_FILE);
    for path in [&model_path, &tokenizer_path] {
        if !path.is_file() {
            return Err(Error::Configuration(format!(
                "embedding model file not found: {} (set LANTERN_EMBEDDING_MODEL_DIR, or LANTERN_EMBEDDER=hashing to index offline)",
                path.display()
            )));
        }
    }
    Ok((model_path, tokenizer_path))
}

impl OnnxModel {
    fn encode(&self, text: &str) -> Result<EncodedText> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| Error::Embedding(format!("tokenization failed: {}", e)))?;

        let take = |values: &[u32]| -> Vec<i64> {
            values.iter().take(self.max_length).map(|&v| i64::from(v)).collect()
        };
        Ok(EncodedText {
            input_ids: take(encoding.get_ids()),
            attention_mask: take(encoding.get_attention_mask()),
            token_type_ids: take(encoding.get_type_ids()),
        })
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encoded = texts
            .iter()
            .map(|text| self.encode(text))
            .collect::<Result<Vec<_>>>()?;
        let (padded, seq_len) = pad_batch(encoded);
        let batch_size = padded.len();

        let tensor = |pick: fn(&EncodedText) -> &[i64]| -> Result<TValue> {
            let data: Vec<i64> = padded.iter().flat_map(|e| pick(e).iter().copied()).collect();
            Tensor::from_shape(&[batch_size, seq_len], &data)
                .map(TValue::from)
                .map_err(|e| Error::Embedding(e.to_string()))
        };
        let all_inputs = [
            tensor(|e| e.input_ids.as_slice())?,
            tensor(|e| e.attention_mask.as_slice())?,
            tensor(|e| e.token_type_ids.as_slice())?,
        ];
        let inputs: TVec<TValue> = all_inputs.into_iter().take(self.input_count).collect();

        let outputs = self
            .plan
            .run(inputs)
            .map_err(|e| Error::Embedding(format!("inference failed: {}", e)))?;
        let hidden = outputs
            .first()
            .ok_or_else(|| Error::Embedding("model produced no outputs".to_string()))?
            .to_array_view::<f32>()
            .map_err(|e| Error::Embedding(e.to_string()))?
            .into_dimensionality::<tract_ndarray::Ix3>()
            .map_err(|e| Error::Embedding(format!("unexpected output shape: {}", e)))?;

        let hidden_size = hidden.shape()[2];
        if hidden_size != self.dimension {
            return Err(Error::Embedding(format!(
                "expected dimension {}, got {}",
                self.dimension, hidden_size
            )));
        }

        let vectors = padded
            .iter()
            .enumerate()
            .map(|(i, encoded)| {
                let tokens = hidden.index_axis(tract_ndarray::Axis(0), i);
                let rows = tokens.outer_iter().map(|row| row.to_vec());
                let mut vector = mean_pool(rows, &encoded.attention_mask, hidden_size);
                l2_normalize(&mut vector);
                vector
            })
            .collect();
        Ok(vectors)
    }
}

/// Pad every encoding with zeros up to the longest one
fn pad_batch(mut batch: Vec<EncodedText>) -> (Vec<EncodedText>, usize) {
    let seq_len = batch.iter().map(|e| e.input_ids.len()).max().unwrap_or(0);
    for encoded in &mut batch {
        encoded.input_ids.resize(seq_len, 0);
        encoded.attention_mask.resize(seq_len, 0);
        encoded.token_type_ids.resize(seq_len, 0);
    }
    (batch, seq_len)
}

/// Average the token vectors whose attention mask is set
fn mean_pool<I>(token_vectors: I, attention_mask: &[i64], hidden_size: usize) -> Vec<f32>
where
    I: IntoIterator<Item = Vec<f32>>,
{
    let mut sum = vec![0.0f32; hidden_size];
    let mut count = 0.0f32;
    for (row, &mask) in token_vectors.into_iter().zip(attention_mask) {
        if mask > 0 {
            for (acc, value) in sum.iter_mut().zip(&row) {
                *acc += value;
            }
            count += 1.0;
        }
    }
    if count > 0.0 {
        sum.iter_mut().for_each(|v| *v /= count);
    }
    sum
}

fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|v| *v /= norm);
    }
}

#[async_trait]
impl Embedder for OnnxEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.model.dimension
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let model = Arc::clone(&self.model);
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || model.embed_batch(&texts))
            .await
            .map_err(|e| Error::Embedding(format!("embedding task failed: {}", e)))?
    }
}
