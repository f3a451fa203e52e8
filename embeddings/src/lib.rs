//! # Embeddings
//!
//! This crate turns catalog and query text into dense vectors and ranks
//! them by cosine similarity. It is the foundation of the recommendation
//! pipeline.
//!
//! ## Features
//!
//! - **Embedding Generation**: OpenAI-backed text embeddings
//! - **Offline Mode**: deterministic token-hash vectors, explicit opt-in
//! - **Caching**: bounded cache keyed by normalized text
//! - **Similarity Math**: normalization and top-k ranking
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Embeddings System                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  EmbeddingProvider ──► CachedEmbedder ──► Embedding             │
//! │       │                      │                 │                │
//! │       ▼                      ▼                 ▼                │
//! │  OpenAI / Hash        EmbeddingCache      similarity math       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod error;
pub mod provider;
pub mod similarity;

pub use cache::{CachedEmbedder, EmbeddingCache};
pub use error::{EmbeddingError, Result};
pub use provider::{EmbeddingProvider, HashEmbeddings, OpenAiEmbeddings};
pub use similarity::{ScoredRow, cosine_similarity, dot_product, find_top_k, normalize};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Dimension of OpenAI `text-embedding-3-small` vectors.
pub const OPENAI_DIMENSION: usize = 1536;

/// Dimension of the offline token-hash vectors.
pub const HASH_DIMENSION: usize = 384;
