//! Retrieval and answering configuration

use lantern_core::{Error, GenerationConfig, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::embedder::HashingEmbedder;
use crate::onnx_embedder::OnnxEmbedder;
use crate::index_builder::IndexPaths;

/// Which embedder builds and queries the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    /// Pretrained sentence encoder run locally from ONNX files
    Onnx,
    /// Deterministic feature-hashing embedder for offline use and tests
    Hashing,
    /// OpenAI-compatible `/embeddings` endpoint
    Remote,
}

impl FromStr for EmbedderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "onnx" | "minilm" => Ok(EmbedderKind::Onnx),
            "hashing" => Ok(EmbedderKind::Hashing),
            "remote" | "http" => Ok(EmbedderKind::Remote),
            other => Err(Error::Configuration(format!(
                "unknown embedder '{}', expected 'onnx', 'hashing' or 'remote'",
                other
            ))),
        }
    }
}

/// Configuration for indexing, retrieval and prompting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    pub docs_dir: PathBuf,
    pub index_path: PathBuf,
    pub texts_path: PathBuf,
    pub top_k: usize,
    pub answer_language: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub embedder: EmbedderKind,
    pub embedding_dim: usize,
    pub embedding_model_dir: PathBuf,
    pub embedding_url: Option<String>,
    pub embedding_model: Option<String>,
    #[serde(skip_serializing, default)]
    pub embedding_api_key: Option<String>,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("stories"),
            index_path: PathBuf::from("story_index.json"),
            texts_path: PathBuf::from("story_texts.txt"),
            top_k: 2,
            answer_language: None,
            max_tokens: 300,
            temperature: 0.3,
            embedder: EmbedderKind::Onnx,
            embedding_dim: HashingEmbedder::DEFAULT_DIMENSION,
            embedding_model_dir: PathBuf::from(OnnxEmbedder::DEFAULT_MODEL_DIR),
            embedding_url: None,
            embedding_model: None,
            embedding_api_key: None,
        }
    }
}

impl RagConfig {
    /// Create configuration from environment variables (and `.env`)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let top_k = parse_or(&lookup, "LANTERN_TOP_K", defaults.top_k)?;
        if top_k == 0 {
            return Err(Error::Configuration("LANTERN_TOP_K must be at least 1".to_string()));
        }

        let embedding_dim = parse_or(&lookup, "LANTERN_EMBEDDING_DIM", defaults.embedding_dim)?;
        if embedding_dim == 0 {
            return Err(Error::Configuration(
                "LANTERN_EMBEDDING_DIM must be at least 1".to_string(),
            ));
        }

        let embedder = match lookup("LANTERN_EMBEDDER") {
            Some(raw) => raw.parse()?,
            None => defaults.embedder,
        };

        let config = Self {
            docs_dir: lookup("LANTERN_DOCS_DIR").map(PathBuf::from).unwrap_or(defaults.docs_dir),
            index_path: lookup("LANTERN_INDEX_PATH").map(PathBuf::from).unwrap_or(defaults.index_path),
            texts_path: lookup("LANTERN_TEXTS_PATH").map(PathBuf::from).unwrap_or(defaults.texts_path),
            top_k,
            answer_language: lookup("LANTERN_ANSWER_LANGUAGE").map(|l| l.trim().to_string()),
            max_tokens: parse_or(&lookup, "LANTERN_MAX_TOKENS", defaults.max_tokens)?,
            temperature: parse_or(&lookup, "LANTERN_TEMPERATURE", defaults.temperature)?,
            embedder,
            embedding_dim,
            embedding_model_dir: lookup("LANTERN_EMBEDDING_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.embedding_model_dir),
            embedding_url: lookup("LANTERN_EMBEDDING_URL"),
            embedding_model: lookup("LANTERN_EMBEDDING_MODEL"),
            embedding_api_key: lookup("LANTERN_EMBEDDING_API_KEY"),
        };

        if config.embedder == EmbedderKind::Remote && config.embedding_url.is_none() {
            return Err(Error::Configuration(
                "LANTERN_EMBEDDER=remote requires LANTERN_EMBEDDING_URL".to_string(),
            ));
        }

        Ok(config)
    }

    /// Paths of the persisted index and text store
    pub fn index_paths(&self) -> IndexPaths {
        IndexPaths::new(&self.index_path, &self.texts_path)
    }

    /// Generation parameters sent with every completion request
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            max_tokens: self.max_tokens,
            temperature: Some(self.temperature),
        }
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| Error::Configuration(format!("{} has an invalid value: {}", key, raw))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<RagConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RagConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.top_k, 2);
        assert_eq!(config.embedder, EmbedderKind::Onnx);
        assert_eq!(config.embedding_dim, 384);
        assert_eq!(
            config.embedding_model_dir,
            PathBuf::from("models/all-MiniLM-L6-v2")
        );
        assert_eq!(config.index_paths().index, PathBuf::from("story_index.json"));
        assert_eq!(config.index_paths().texts, PathBuf::from("story_texts.txt"));
        assert!(config.answer_language.is_none());

        let generation = config.generation_config();
        assert_eq!(generation.max_tokens, 300);
        assert_eq!(generation.temperature, Some(0.3));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("LANTERN_TOP_K", "4"),
            ("LANTERN_ANSWER_LANGUAGE", " Hindi "),
            ("LANTERN_INDEX_PATH", "/tmp/idx.json"),
            ("LANTERN_EMBEDDER", "remote"),
            ("LANTERN_EMBEDDING_URL", "http://localhost:11434/v1"),
            ("LANTERN_EMBEDDING_MODEL", "all-minilm"),
        ])
        .unwrap();
        assert_eq!(config.top_k, 4);
        assert_eq!(config.answer_language.as_deref(), Some("Hindi"));
        assert_eq!(config.index_path, PathBuf::from("/tmp/idx.json"));
        assert_eq!(config.embedder, EmbedderKind::Remote);
        assert_eq!(config.embedding_model.as_deref(), Some("all-minilm"));
    }

    #[test]
    fn test_embedder_names() {
        assert_eq!("onnx".parse::<EmbedderKind>().unwrap(), EmbedderKind::Onnx);
        assert_eq!(" MiniLM ".parse::<EmbedderKind>().unwrap(), EmbedderKind::Onnx);
        assert_eq!("hashing".parse::<EmbedderKind>().unwrap(), EmbedderKind::Hashing);
        assert_eq!("http".parse::<EmbedderKind>().unwrap(), EmbedderKind::Remote);

        let config = config_from(&[
            ("LANTERN_EMBEDDER", "hashing"),
            ("LANTERN_EMBEDDING_MODEL_DIR", "/opt/models/minilm"),
        ])
        .unwrap();
        assert_eq!(config.embedder, EmbedderKind::Hashing);
        assert_eq!(config.embedding_model_dir, PathBuf::from("/opt/models/minilm"));
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = config_from(&[("LANTERN_ANSWER_LANGUAGE", "   "), ("LANTERN_TOP_K", "")]).unwrap();
        assert!(config.answer_language.is_none());
        assert_eq!(config.top_k, 2);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            config_from(&[("LANTERN_TOP_K", "two")]),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            config_from(&[("LANTERN_TOP_K", "0")]),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            config_from(&[("LANTERN_EMBEDDER", "faiss")]),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            config_from(&[("LANTERN_EMBEDDER", "remote")]),
            Err(Error::Configuration(_))
        ));
    }
}
