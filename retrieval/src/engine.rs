//! Recommendation engine over the vector index.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use shopmate_catalog::{ProductId, ProductStore};
use shopmate_completions::{ChatMessage, CompletionClient, CompletionRequest};
use shopmate_embeddings::{
    CachedEmbedder, EmbeddingCache, EmbeddingProvider, HashEmbeddings, OpenAiEmbeddings,
};

use crate::config::{EmbeddingBackend, RetrievalConfig};
use crate::error::Result;
use crate::index::VectorIndex;

/// Fixed instruction for turning a product photo into a catalog query.
const IMAGE_QUERY_PROMPT: &str = "You analyze a shopping product photo and produce a concise \
    English query that captures product type, visible brand if any, and key attributes like \
    color/material. Return a short phrase (<=12 words), no full sentences.";

/// A ranked product hit with its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductHit {
    /// Product id.
    pub id: ProductId,

    /// Product name.
    pub name: String,

    /// Price in the shop currency.
    pub price: f64,

    /// Category label.
    pub category: String,

    /// Brand, if known.
    pub brand: Option<String>,

    /// Cosine similarity of the query to this product's text.
    pub similarity: f32,

    /// Human-readable justification for surfacing this hit.
    pub reason: String,
}

/// Threshold- and budget-filtered retrieval over the catalog.
pub struct RecommendationEngine {
    /// The similarity index.
    index: Arc<VectorIndex>,

    /// Product resolution.
    store: Arc<dyn ProductStore>,

    /// Vision-capable completion backend for image queries.
    completions: Arc<dyn CompletionClient>,

    /// Query defaults and backend selection.
    config: RetrievalConfig,
}

impl RecommendationEngine {
    /// Create an engine, wiring the embedding backend from the config.
    pub fn new(
        config: RetrievalConfig,
        store: Arc<dyn ProductStore>,
        completions: Arc<dyn CompletionClient>,
    ) -> Self {
        let provider: Arc<dyn EmbeddingProvider> = match config.embedding.backend {
            EmbeddingBackend::OpenAi => {
                let mut provider = OpenAiEmbeddings::new();
                if let Some(model) = &config.embedding.model {
                    provider = provider.with_model(model.clone());
                }
                Arc::new(provider)
            }
            EmbeddingBackend::OfflineHash => Arc::new(HashEmbeddings::new()),
        };

        let embedder = Arc::new(CachedEmbedder::new(
            provider,
            EmbeddingCache::new(config.embedding.cache_max_entries),
        ));
        let index = Arc::new(VectorIndex::new(embedder, store.clone(), &config));

        Self {
            index,
            store,
            completions,
            config,
        }
    }

    /// Recommend products for a free-text query.
    ///
    /// Hits scoring strictly below `min_similarity` are dropped, surviving
    /// ids are resolved against the product store, and a `budget` (if given)
    /// drops anything priced above it. Index order is preserved throughout;
    /// an empty result is a normal outcome.
    pub async fn recommend(
        &self,
        query: &str,
        top_k: usize,
        min_similarity: f32,
        budget: Option<f64>,
    ) -> Result<Vec<ProductHit>> {
        let reason = format!("Recommended based on your preferences: '{query}'");
        self.ranked_hits(query, top_k, min_similarity, budget, reason)
            .await
    }

    /// Recommend products for a free-text query using the configured text
    /// defaults.
    pub async fn recommend_text(&self, query: &str, budget: Option<f64>) -> Result<Vec<ProductHit>> {
        self.recommend(
            query,
            self.config.text_query.top_k,
            self.config.text_query.min_similarity,
            budget,
        )
        .await
    }

    /// Recommend products matching a product photo.
    ///
    /// The photo is first turned into a short descriptive phrase by a
    /// vision completion call; a blank phrase short-circuits to an empty
    /// result without touching the index. The retrieval itself runs with
    /// the looser image-query defaults. Vision failures degrade to an empty
    /// result rather than failing the turn.
    pub async fn recommend_by_image(&self, image_url: &str) -> Result<Vec<ProductHit>> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(IMAGE_QUERY_PROMPT),
            ChatMessage::user_with_image("Describe the product for catalog search.", image_url),
        ])
        .with_max_tokens(60)
        .with_temperature(0.2);

        let query = match self.completions.complete(request).await {
            Ok(message) => message.content.unwrap_or_default().trim().to_string(),
            Err(e) => {
                warn!("Image description failed, returning no hits: {e}");
                return Ok(Vec::new());
            }
        };

        if query.is_empty() {
            debug!("Vision call produced an empty description, skipping retrieval");
            return Ok(Vec::new());
        }

        info!("Image query text: {query}");

        let reason = format!("Matched image query: '{query}'");
        self.ranked_hits(
            &query,
            self.config.image_query.top_k,
            self.config.image_query.min_similarity,
            None,
            reason,
        )
        .await
    }

    /// Rebuild the index from the product store.
    pub async fn rebuild_index(&self) -> Result<usize> {
        self.index.build().await
    }

    /// The underlying vector index.
    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    /// Query, filter, and resolve hits while preserving index order.
    async fn ranked_hits(
        &self,
        query: &str,
        top_k: usize,
        min_similarity: f32,
        budget: Option<f64>,
        reason: String,
    ) -> Result<Vec<ProductHit>> {
        let scored = self.index.query(query, top_k).await?;

        let surviving: Vec<(ProductId, f32)> = scored
            .into_iter()
            .filter(|(_, score)| *score >= min_similarity)
            .collect();

        if surviving.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<ProductId> = surviving.iter().map(|(id, _)| *id).collect();
        let products = self.store.get_by_ids(&ids).await?;

        let mut hits = Vec::with_capacity(surviving.len());
        for (id, score) in surviving {
            let Some(product) = products.get(&id) else {
                continue;
            };
            if let Some(limit) = budget {
                if product.price > limit {
                    continue;
                }
            }
            hits.push(ProductHit {
                id,
                name: product.name.clone(),
                price: product.price,
                category: product.category.clone(),
                brand: product.brand.clone(),
                similarity: score,
                reason: reason.clone(),
            });
        }

        debug!("Query '{query}' produced {} hits", hits.len());
        Ok(hits)
    }
}
