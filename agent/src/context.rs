//! Conversation context assembly and history compression.
//!
//! Prompts are rebuilt from scratch every turn: persona first, then at most
//! one conversation summary, then the most recent raw turns, then the new
//! user message. When the history grows past `max_history_turns` the older
//! turns are compressed by a low-temperature completion call; a summary
//! persisted into the history by an earlier turn is carried forward only if
//! no fresh one was produced.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use shopmate_completions::{ChatMessage, CompletionClient, CompletionRequest, Role};

/// Prefix marking a persisted summary turn in the history.
pub const SUMMARY_MARKER: &str = "Conversation summary:";

/// Instruction for the summarization call.
const SUMMARY_PROMPT: &str = "You are an assistant that produces a brief, neutral conversation \
    summary. Capture the user's preferences, constraints (e.g., budget), decisions taken, and \
    any pending questions. Keep it under 120 words, in English.";

/// Instruction appended after tool results, before the synthesis call.
const SYNTHESIS_PROMPT: &str = "Use the tool results above to craft a concise, natural \
    recommendation. Do not mention tools or internal IDs. Refer to product names (and price if \
    helpful). Reply in English and keep it to 1-2 sentences.";

/// Default shopping-assistant persona.
const DEFAULT_PERSONA: &str = "You are a helpful shopping assistant for an e-commerce site.\n\
    \n\
    Capabilities:\n\
    1) General conversation with the agent (e.g., 'What's your name?', 'What can you do?')\n\
    2) Text-Based Product Recommendation (e.g., 'Recommend me a t-shirt for sports.')\n\
    3) Image-Based Product Search.\n\
    \n\
    Important constraints:\n\
    - Product recommendation and search are limited to items in a predefined catalog.\n\
    - Keep responses concise and clear.\n\
    - Reply in English.\n\
    - When tool results are present, synthesize them into a natural sentence recommendation.\n\
    \x20 For example: \"I recommend the blue t-shirt for you.\" Do not mention tools or IDs.\n\
    \x20 Prefer top relevant items; reference product names (and price if helpful).";

/// At most this many older turns feed a single summarization call.
const SUMMARY_WINDOW: usize = 20;

/// One stored turn of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Who spoke.
    pub role: Role,

    /// What was said.
    pub content: String,

    /// When the turn was recorded.
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    /// Record a turn now.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Whether this turn is a persisted conversation summary.
    pub fn is_summary(&self) -> bool {
        self.role == Role::System && self.content.starts_with(SUMMARY_MARKER)
    }
}

/// Builds per-turn prompts and compresses long histories.
pub struct ContextManager {
    /// Backend used for summarization calls.
    completions: Arc<dyn CompletionClient>,

    /// Persona system prompt, first message of every built prompt.
    system_prompt: String,

    /// History length beyond which a fresh summary is generated.
    max_history_turns: usize,

    /// Number of trailing turns always included verbatim.
    keep_recent_turns: usize,
}

impl ContextManager {
    /// Create a manager with the default persona and compression limits.
    pub fn new(completions: Arc<dyn CompletionClient>) -> Self {
        Self {
            completions,
            system_prompt: DEFAULT_PERSONA.to_string(),
            max_history_turns: 4,
            keep_recent_turns: 2,
        }
    }

    /// Override the persona system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Override the compression limits.
    pub fn with_limits(mut self, max_history_turns: usize, keep_recent_turns: usize) -> Self {
        self.max_history_turns = max_history_turns;
        self.keep_recent_turns = keep_recent_turns;
        self
    }

    /// Summarize the turns older than the always-kept tail.
    ///
    /// Returns `None` when there is nothing old enough to compress, and
    /// degrades to `None` when the summarization call fails.
    pub async fn summarize(&self, history: &[ConversationTurn]) -> Option<String> {
        if history.len() <= self.keep_recent_turns {
            return None;
        }
        let older = &history[..history.len() - self.keep_recent_turns];
        if older.is_empty() {
            return None;
        }

        let window_start = older.len().saturating_sub(SUMMARY_WINDOW);
        let mut messages = vec![ChatMessage::system(SUMMARY_PROMPT)];
        for turn in &older[window_start..] {
            messages.push(ChatMessage::text(turn.role, turn.content.clone()));
        }

        let request = CompletionRequest::new(messages)
            .with_max_tokens(200)
            .with_temperature(0.2);

        match self.completions.complete(request).await {
            Ok(message) => {
                let summary = message.content.unwrap_or_default();
                if summary.trim().is_empty() {
                    None
                } else {
                    Some(summary)
                }
            }
            Err(e) => {
                warn!("History summarization failed: {e}");
                None
            }
        }
    }

    /// Summarize the history into a marker-prefixed system turn the caller
    /// can persist between requests.
    pub async fn summarize_for_memory(
        &self,
        history: &[ConversationTurn],
    ) -> Option<ConversationTurn> {
        let summary = self.summarize(history).await?;
        Some(ConversationTurn::new(
            Role::System,
            format!("{SUMMARY_MARKER} {summary}"),
        ))
    }

    /// Build the prompt for a new user message.
    ///
    /// At most one summary appears in the result: a freshly generated one
    /// when the history is long enough, otherwise the newest summary already
    /// persisted in the history, otherwise none.
    pub async fn build_messages(
        &self,
        history: &[ConversationTurn],
        user_message: &str,
    ) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::system(self.system_prompt.clone())];

        let fresh = if history.len() > self.max_history_turns {
            self.summarize(history).await
        } else {
            None
        };

        match fresh {
            Some(summary) => {
                debug!("Compressed {} history turns into a summary", history.len());
                messages.push(ChatMessage::system(format!("{SUMMARY_MARKER} {summary}")));
            }
            None => {
                if let Some(carried) = history.iter().rev().find(|turn| turn.is_summary()) {
                    messages.push(ChatMessage::system(carried.content.clone()));
                }
            }
        }

        let tail_start = history.len().saturating_sub(self.keep_recent_turns);
        for turn in &history[tail_start..] {
            messages.push(ChatMessage::text(turn.role, turn.content.clone()));
        }

        messages.push(ChatMessage::user(user_message));
        messages
    }

    /// Append the synthesis instruction after tool results.
    pub fn add_synthesis_instruction(&self, messages: &mut Vec<ChatMessage>) {
        messages.push(ChatMessage::system(SYNTHESIS_PROMPT));
    }
}
