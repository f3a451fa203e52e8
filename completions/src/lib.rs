//! # Completions
//!
//! Chat message model, tool declarations, and the completion client the
//! orchestration layer talks to. The client surface is deliberately narrow:
//! `complete(request) -> message`, where the returned message either carries
//! text or a list of requested tool calls.

pub mod client;
pub mod error;
pub mod message;
pub mod tooling;

pub use client::{CompletionClient, CompletionMessage, CompletionRequest, OpenAiChatClient};
pub use error::{CompletionError, Result};
pub use message::{ChatMessage, ContentPart, FunctionCall, MessageContent, Role, ToolCallRequest};
pub use tooling::{ToolDecl, object_schema};
