//! Turn orchestration.
//!
//! A turn is a small state machine over an append-only message log:
//!
//! ```text
//! AwaitingIntent ──(no tool calls)──────────────► Done
//!       │
//!       └─(tool calls)─► ExecutingTools ─► Synthesizing ─► Done
//! ```
//!
//! The intent call carries the tool catalog; if the model requests tools they
//! are executed in request order, their JSON results appended as tool
//! messages, and a second completion call synthesizes the final answer.
//! Backend failures never escape a turn: the caller gets a fixed apology and
//! an empty tool-call list.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use shopmate_completions::{
    ChatMessage, CompletionClient, CompletionRequest, ToolCallRequest, ToolDecl,
};
use shopmate_retrieval::RecommendationEngine;

use crate::context::{ContextManager, ConversationTurn};
use crate::error::Result;
use crate::tools::{ToolInvocation, ToolRequest, tool_catalog, unknown_tool_result};

/// Fallback answer when a completion call fails mid-turn.
const APOLOGY: &str = "Sorry, I cannot process your request right now. Please try again later.";

/// Token and sampling parameters for intent and synthesis calls.
const TURN_MAX_TOKENS: u32 = 500;
const TURN_TEMPERATURE: f32 = 0.7;

/// The outcome of one conversation turn.
#[derive(Debug, Clone, Serialize)]
pub struct AgentReply {
    /// Natural-language answer for the user.
    pub response: String,

    /// Tool calls executed during the turn, in request order.
    pub tool_calls: Vec<ToolInvocation>,
}

impl AgentReply {
    fn apology() -> Self {
        Self {
            response: APOLOGY.to_string(),
            tool_calls: Vec::new(),
        }
    }
}

/// Where a turn currently stands.
enum TurnPhase {
    /// Waiting for the model to answer or request tools.
    AwaitingIntent,

    /// Executing the requested tool calls.
    ExecutingTools(Vec<ToolCallRequest>),

    /// Tool results are in the log; asking the model for the final answer.
    Synthesizing,

    /// The turn produced its reply.
    Done(AgentReply),
}

/// Conversation orchestrator: context assembly, tool dispatch, synthesis.
pub struct AgentService {
    /// Completion backend for intent and synthesis calls.
    completions: Arc<dyn CompletionClient>,

    /// Retrieval behind the tool surface.
    engine: Arc<RecommendationEngine>,

    /// Prompt assembly and history compression.
    context: ContextManager,

    /// Declarations attached to every intent call.
    tools: Vec<ToolDecl>,
}

impl AgentService {
    /// Create a service with the default persona and tool catalog.
    pub fn new(completions: Arc<dyn CompletionClient>, engine: Arc<RecommendationEngine>) -> Self {
        let context = ContextManager::new(completions.clone());
        Self {
            completions,
            engine,
            context,
            tools: tool_catalog(),
        }
    }

    /// Replace the context manager (persona or compression limits).
    pub fn with_context_manager(mut self, context: ContextManager) -> Self {
        self.context = context;
        self
    }

    /// Run one conversation turn.
    ///
    /// Never fails: any completion backend error inside the turn collapses
    /// to a fixed apology reply with no tool calls.
    pub async fn generate_response(
        &self,
        user_message: &str,
        history: &[ConversationTurn],
    ) -> AgentReply {
        match self.run_turn(user_message, history).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Turn failed, answering with apology: {e}");
                AgentReply::apology()
            }
        }
    }

    /// Summarize the history into a persistable system turn.
    pub async fn summarize_for_memory(
        &self,
        history: &[ConversationTurn],
    ) -> Option<ConversationTurn> {
        self.context.summarize_for_memory(history).await
    }

    /// Rebuild the product index, returning the number of indexed items.
    pub async fn rebuild_index(&self) -> Result<usize> {
        Ok(self.engine.rebuild_index().await?)
    }

    async fn run_turn(
        &self,
        user_message: &str,
        history: &[ConversationTurn],
    ) -> Result<AgentReply> {
        let mut messages = self.context.build_messages(history, user_message).await;
        let mut invocations: Vec<ToolInvocation> = Vec::new();
        let mut phase = TurnPhase::AwaitingIntent;

        loop {
            phase = match phase {
                TurnPhase::AwaitingIntent => {
                    let request = CompletionRequest::new(messages.clone())
                        .with_tools(self.tools.clone())
                        .with_max_tokens(TURN_MAX_TOKENS)
                        .with_temperature(TURN_TEMPERATURE);
                    let message = self.completions.complete(request).await?;

                    if message.wants_tools() {
                        info!("Model requested {} tool call(s)", message.tool_calls.len());
                        messages.push(ChatMessage::assistant_tool_calls(
                            message.content,
                            message.tool_calls.clone(),
                        ));
                        TurnPhase::ExecutingTools(message.tool_calls)
                    } else {
                        info!("Model answered directly without tools");
                        TurnPhase::Done(AgentReply {
                            response: message.content.unwrap_or_default(),
                            tool_calls: Vec::new(),
                        })
                    }
                }

                TurnPhase::ExecutingTools(calls) => {
                    for call in calls {
                        let (arguments, result) = self.execute_call(&call).await?;
                        messages.push(ChatMessage::tool_result(
                            call.id.clone(),
                            call.function.name.clone(),
                            serde_json::to_string(&result)?,
                        ));
                        invocations.push(ToolInvocation {
                            function: call.function.name,
                            arguments,
                            result,
                        });
                    }
                    self.context.add_synthesis_instruction(&mut messages);
                    TurnPhase::Synthesizing
                }

                TurnPhase::Synthesizing => {
                    let request = CompletionRequest::new(messages.clone())
                        .with_max_tokens(TURN_MAX_TOKENS)
                        .with_temperature(TURN_TEMPERATURE);
                    let message = self.completions.complete(request).await?;

                    TurnPhase::Done(AgentReply {
                        response: message.content.unwrap_or_default(),
                        tool_calls: std::mem::take(&mut invocations),
                    })
                }

                TurnPhase::Done(reply) => return Ok(reply),
            };
        }
    }

    /// Execute a single tool call, returning its parsed arguments and JSON
    /// result.
    async fn execute_call(&self, call: &ToolCallRequest) -> Result<(Value, Value)> {
        let request = ToolRequest::parse(&call.function.name, &call.function.arguments)?;
        info!("Executing tool call: {}", request.name());

        match request {
            ToolRequest::RecommendProducts(args) => {
                let hits = self
                    .engine
                    .recommend_text(&args.user_preferences, args.budget)
                    .await?;
                Ok((serde_json::to_value(&args)?, serde_json::to_value(&hits)?))
            }
            ToolRequest::SearchByImage(args) => {
                let hits = self.engine.recommend_by_image(&args.image_url).await?;
                Ok((serde_json::to_value(&args)?, serde_json::to_value(&hits)?))
            }
            ToolRequest::Unknown { name } => {
                warn!("Model requested unknown tool: {name}");
                let arguments = serde_json::from_str(&call.function.arguments)
                    .unwrap_or_else(|_| Value::String(call.function.arguments.clone()));
                Ok((arguments, unknown_tool_result(&name)))
            }
        }
    }
}
