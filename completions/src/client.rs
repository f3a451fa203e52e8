//! Completion client.
//!
//! `CompletionClient` is the seam between the orchestration layer and the
//! model backend. `OpenAiChatClient` is the production implementation over
//! the OpenAI chat-completions endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CompletionError, Result};
use crate::message::{ChatMessage, ToolCallRequest};
use crate::tooling::ToolDecl;

/// A completion request: messages plus optional tool catalog and sampling
/// parameters.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    /// The role-tagged message sequence.
    pub messages: Vec<ChatMessage>,

    /// Tools the model may call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDecl>>,

    /// Tool choice mode (`"auto"` leaves the decision to the model).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,

    /// Generation cap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    /// Create a request from a message sequence.
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            tools: None,
            tool_choice: None,
            max_tokens: None,
            temperature: None,
        }
    }

    /// Attach a tool catalog with automatic tool choice.
    pub fn with_tools(mut self, tools: Vec<ToolDecl>) -> Self {
        self.tools = Some(tools);
        self.tool_choice = Some("auto".to_string());
        self
    }

    /// Set the generation cap.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// The message a completion call produced: text, tool calls, or both.
#[derive(Debug, Clone, Default)]
pub struct CompletionMessage {
    /// Text content, if any.
    pub content: Option<String>,

    /// Tool calls the model requested; empty means a direct answer.
    pub tool_calls: Vec<ToolCallRequest>,
}

impl CompletionMessage {
    /// Whether the model asked for tools.
    pub fn wants_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Trait for completion backends.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Run one completion call.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionMessage>;

    /// Check if the backend is available (API key set, etc.).
    fn is_available(&self) -> bool;
}

/// OpenAI chat-completions client.
pub struct OpenAiChatClient {
    /// API key.
    api_key: Option<String>,

    /// API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Model to request.
    model: String,
}

impl OpenAiChatClient {
    /// Create a new client, reading the key from the environment.
    pub fn new() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            base_url: "https://api.openai.com/v1".to_string(),
            client: reqwest::Client::new(),
            model: "gpt-4o-mini".to_string(),
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

impl Default for OpenAiChatClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionClient for OpenAiChatClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionMessage> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(CompletionError::ProviderNotConfigured)?;

        debug!(
            "Completion call: {} messages, tools: {}",
            request.messages.len(),
            request.tools.as_ref().map(Vec::len).unwrap_or(0)
        );

        let mut body = serde_json::to_value(&request)?;
        body["model"] = serde_json::Value::String(self.model.clone());

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(CompletionError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CompletionError::ApiRequest(format!(
                "API error: {error_text}"
            )));
        }

        let result: ChatCompletionResponse = response.json().await?;

        let choice = result
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::InvalidResponse("No choices in response".to_string()))?;

        info!(
            "Completion returned: content={}, tool_calls={}",
            choice.message.content.is_some(),
            choice.message.tool_calls.as_ref().map(Vec::len).unwrap_or(0)
        );

        Ok(CompletionMessage {
            content: choice.message.content,
            tool_calls: choice.message.tool_calls.unwrap_or_default(),
        })
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }
}

/// OpenAI API response format.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCallRequest>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_missing_key_is_configuration_error() {
        let client = OpenAiChatClient {
            api_key: None,
            base_url: "http://localhost:0".to_string(),
            client: reqwest::Client::new(),
            model: "gpt-4o-mini".to_string(),
        };

        let err = client
            .complete(CompletionRequest::new(vec![ChatMessage::user("hi")]))
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::ProviderNotConfigured));
    }

    #[tokio::test]
    async fn test_direct_answer_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "Hello there!", "tool_calls": null}}]
            })))
            .mount(&server)
            .await;

        let client = OpenAiChatClient::new()
            .with_api_key("test-key")
            .with_base_url(server.uri());

        let message = client
            .complete(CompletionRequest::new(vec![ChatMessage::user("hi")]))
            .await
            .unwrap();

        assert_eq!(message.content.as_deref(), Some("Hello there!"));
        assert!(!message.wants_tools());
    }

    #[tokio::test]
    async fn test_tool_call_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "recommend_products",
                            "arguments": "{\"user_preferences\":\"sports shirt\"}"
                        }
                    }]
                }}]
            })))
            .mount(&server)
            .await;

        let client = OpenAiChatClient::new()
            .with_api_key("test-key")
            .with_base_url(server.uri());

        let message = client
            .complete(CompletionRequest::new(vec![ChatMessage::user("shirt?")]))
            .await
            .unwrap();

        assert!(message.wants_tools());
        assert_eq!(message.tool_calls[0].function.name, "recommend_products");
    }
}
