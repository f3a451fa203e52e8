//! Error types for the retrieval engine.

use thiserror::Error;

/// Result type alias for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Errors that can occur in the retrieval engine.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// An index build produced no usable vectors. The previous snapshot, if
    /// any, stays authoritative.
    #[error("no embeddings generated for catalog items")]
    EmptyCorpus,

    /// Embedding generation failed.
    #[error("embedding error: {0}")]
    Embedding(#[from] shopmate_embeddings::EmbeddingError),

    /// Product store access failed.
    #[error("catalog error: {0}")]
    Catalog(#[from] shopmate_catalog::CatalogError),

    /// Completion backend failed (image description).
    #[error("completion error: {0}")]
    Completion(#[from] shopmate_completions::CompletionError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
