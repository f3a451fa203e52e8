//! # Agent
//!
//! Conversation orchestration over the retrieval engine:
//!
//! - **ContextManager**: prompt assembly and history compression
//! - **ToolRequest**: the closed set of tools the model may call
//! - **AgentService**: the two-phase turn (intent → tools → synthesis)
//!
//! The agent owns no transport. Callers feed it a user message plus the
//! stored history and get back an [`AgentReply`]; persisting turns between
//! requests is the caller's job.

pub mod context;
pub mod error;
pub mod orchestrator;
pub mod tools;

pub use context::{ContextManager, ConversationTurn, SUMMARY_MARKER};
pub use error::{AgentError, Result};
pub use orchestrator::{AgentReply, AgentService};
pub use tools::{
    RECOMMEND_PRODUCTS, RecommendProductsArgs, SEARCH_BY_IMAGE, SearchByImageArgs, ToolInvocation,
    ToolRequest, tool_catalog,
};
