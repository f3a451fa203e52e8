//! Error types for the agent layer.

use thiserror::Error;

/// Result type alias for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;

/// Errors that can occur while orchestrating a conversation turn.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Completion backend failed.
    #[error("completion error: {0}")]
    Completion(#[from] shopmate_completions::CompletionError),

    /// Retrieval failed.
    #[error("retrieval error: {0}")]
    Retrieval(#[from] shopmate_retrieval::RetrievalError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
