//! Error types for catalog access.

use thiserror::Error;

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors that can occur accessing the product store.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Product not found.
    #[error("product not found: {0}")]
    NotFound(i64),

    /// The backing store failed.
    #[error("store error: {0}")]
    Store(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
