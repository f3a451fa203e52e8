//! Configuration for the retrieval engine.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for the retrieval engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Directory holding the index snapshot files.
    pub snapshot_dir: PathBuf,

    /// Embedding backend selection.
    pub embedding: EmbeddingConfig,

    /// Defaults for text queries.
    pub text_query: QueryDefaults,

    /// Defaults for image-derived queries. Looser than the text defaults
    /// because vision descriptions are noisier.
    pub image_query: QueryDefaults,
}

impl RetrievalConfig {
    /// Create a configuration with default values.
    pub fn new(snapshot_dir: impl Into<PathBuf>) -> Self {
        Self {
            snapshot_dir: snapshot_dir.into(),
            embedding: EmbeddingConfig::default(),
            text_query: QueryDefaults {
                top_k: 2,
                min_similarity: 0.5,
            },
            image_query: QueryDefaults {
                top_k: 5,
                min_similarity: 0.4,
            },
        }
    }

    /// Select the embedding backend.
    pub fn with_backend(mut self, backend: EmbeddingBackend) -> Self {
        self.embedding.backend = backend;
        self
    }

    /// Set the text query defaults.
    pub fn with_text_query(mut self, defaults: QueryDefaults) -> Self {
        self.text_query = defaults;
        self
    }

    /// Path of the binary vector blob.
    pub fn index_path(&self) -> PathBuf {
        self.snapshot_dir.join("products.index")
    }

    /// Path of the JSON sidecar (`{ids, dim}`).
    pub fn sidecar_path(&self) -> PathBuf {
        self.snapshot_dir.join("products_meta.json")
    }
}

/// Configuration for the embedding backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Which backend to use.
    pub backend: EmbeddingBackend,

    /// Override for the provider model.
    pub model: Option<String>,

    /// Maximum embedding cache size.
    pub cache_max_entries: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::OpenAi,
            model: None,
            cache_max_entries: 10000,
        }
    }
}

/// Embedding backend selection.
///
/// The hash backend exists for offline and test runs. It is never chosen
/// implicitly: an OpenAI backend without a key fails loudly instead of
/// degrading to hash vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingBackend {
    /// OpenAI embeddings API.
    OpenAi,
    /// Deterministic token-hash vectors (offline mode).
    OfflineHash,
}

/// Per-query-kind retrieval defaults.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QueryDefaults {
    /// Number of candidates fetched from the index.
    pub top_k: usize,

    /// Hits scoring strictly below this are dropped.
    pub min_similarity: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_thresholds() {
        let config = RetrievalConfig::new("/tmp/idx");
        assert_eq!(config.text_query.top_k, 2);
        assert_eq!(config.text_query.min_similarity, 0.5);
        assert_eq!(config.image_query.top_k, 5);
        assert_eq!(config.image_query.min_similarity, 0.4);
    }

    #[test]
    fn test_snapshot_paths() {
        let config = RetrievalConfig::new("/data/faiss");
        assert_eq!(config.index_path(), PathBuf::from("/data/faiss/products.index"));
        assert_eq!(
            config.sidecar_path(),
            PathBuf::from("/data/faiss/products_meta.json")
        );
    }
}
