//! Embedding cache keyed by normalized text.
//!
//! The cache is an explicit object owned by the embedder that wraps it,
//! bounded by entry count with oldest-first eviction. Catalog text is small
//! and finite, so a modest bound is plenty.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::Embedding;
use crate::error::Result;
use crate::provider::EmbeddingProvider;

/// Cache entry for an embedding.
#[derive(Debug, Clone)]
struct CacheEntry {
    /// The embedding vector.
    embedding: Embedding,

    /// Insertion sequence number, used for eviction ordering.
    inserted_at: u64,
}

/// Bounded cache for embeddings to avoid redundant API calls.
pub struct EmbeddingCache {
    /// In-memory cache.
    cache: Arc<RwLock<HashMap<String, CacheEntry>>>,

    /// Monotonic insertion counter.
    sequence: Arc<RwLock<u64>>,

    /// Maximum cache size.
    max_entries: usize,
}

impl EmbeddingCache {
    /// Create a new cache bounded to `max_entries`.
    pub fn new(max_entries: usize) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            sequence: Arc::new(RwLock::new(0)),
            max_entries,
        }
    }

    /// Compute the lookup key for a text/model pair.
    ///
    /// Text is trimmed and lower-cased so that trivially different spellings
    /// of the same query share one entry.
    fn cache_key(text: &str, model: &str) -> String {
        format!("{model}:{}", text.trim().to_lowercase())
    }

    /// Get an embedding from the cache.
    pub async fn get(&self, text: &str, model: &str) -> Option<Embedding> {
        let key = Self::cache_key(text, model);
        let cache = self.cache.read().await;
        cache.get(&key).map(|e| e.embedding.clone())
    }

    /// Put an embedding in the cache, evicting the oldest entry at capacity.
    pub async fn put(&self, text: &str, model: &str, embedding: Embedding) {
        let key = Self::cache_key(text, model);

        let inserted_at = {
            let mut seq = self.sequence.write().await;
            *seq += 1;
            *seq
        };

        let mut cache = self.cache.write().await;

        if !cache.contains_key(&key) && cache.len() >= self.max_entries {
            if let Some(oldest_key) = cache
                .iter()
                .min_by_key(|(_, v)| v.inserted_at)
                .map(|(k, _)| k.clone())
            {
                cache.remove(&oldest_key);
            }
        }

        cache.insert(
            key,
            CacheEntry {
                embedding,
                inserted_at,
            },
        );
        debug!("Cached embedding (model: {model})");
    }

    /// Check if an embedding is cached.
    pub async fn contains(&self, text: &str, model: &str) -> bool {
        let key = Self::cache_key(text, model);
        self.cache.read().await.contains_key(&key)
    }

    /// Number of cached entries.
    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    /// Check if the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.is_empty()
    }

    /// Clear the entire cache.
    pub async fn clear(&self) {
        self.cache.write().await.clear();
        info!("Cleared embedding cache");
    }
}

/// An embedding provider wrapped with a cache.
///
/// All embedding traffic in the pipeline goes through this wrapper; a cache
/// hit returns the stored vector without touching the provider.
pub struct CachedEmbedder {
    provider: Arc<dyn EmbeddingProvider>,
    cache: EmbeddingCache,
}

impl CachedEmbedder {
    /// Create a new cached embedder.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, cache: EmbeddingCache) -> Self {
        Self { provider, cache }
    }

    /// Generate an embedding, using the cache if possible.
    pub async fn embed(&self, text: &str) -> Result<Embedding> {
        let model = self.provider.model();

        if let Some(embedding) = self.cache.get(text, model).await {
            debug!("Cache hit for embedding");
            return Ok(embedding);
        }

        let embedding = self.provider.embed(text).await?;
        self.cache.put(text, model, embedding.clone()).await;
        Ok(embedding)
    }

    /// Embedding dimension of the wrapped provider.
    pub fn dimension(&self) -> usize {
        self.provider.dimension()
    }

    /// Whether the wrapped provider can serve requests.
    pub fn is_available(&self) -> bool {
        self.provider.is_available()
    }

    /// Get the underlying cache.
    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }
}
