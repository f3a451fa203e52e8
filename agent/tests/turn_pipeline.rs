//! End-to-end turn pipeline tests with a scripted completion backend and an
//! offline retrieval engine.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use shopmate_agent::{AgentService, ConversationTurn};
use shopmate_catalog::{InMemoryCatalog, Product};
use shopmate_completions::{
    ChatMessage, CompletionClient, CompletionError, CompletionMessage, CompletionRequest,
    FunctionCall, Role, ToolCallRequest,
};
use shopmate_retrieval::{EmbeddingBackend, RecommendationEngine, RetrievalConfig};

/// Completion backend that replays a fixed script and records every request.
struct ScriptedClient {
    script: Mutex<VecDeque<shopmate_completions::Result<CompletionMessage>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    fn new(script: Vec<shopmate_completions::Result<CompletionMessage>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> shopmate_completions::Result<CompletionMessage> {
        self.requests.lock().unwrap().push(request);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CompletionError::ApiRequest("script exhausted".to_string())))
    }

    fn is_available(&self) -> bool {
        true
    }
}

fn answer(text: &str) -> shopmate_completions::Result<CompletionMessage> {
    Ok(CompletionMessage {
        content: Some(text.to_string()),
        tool_calls: Vec::new(),
    })
}

fn tool_intent(calls: Vec<(&str, &str, &str)>) -> shopmate_completions::Result<CompletionMessage> {
    Ok(CompletionMessage {
        content: None,
        tool_calls: calls
            .into_iter()
            .map(|(id, name, arguments)| ToolCallRequest {
                id: id.to_string(),
                call_type: "function".to_string(),
                function: FunctionCall {
                    name: name.to_string(),
                    arguments: arguments.to_string(),
                },
            })
            .collect(),
    })
}

fn failure() -> shopmate_completions::Result<CompletionMessage> {
    Err(CompletionError::ApiRequest("backend down".to_string()))
}

fn sample_products() -> Vec<Product> {
    vec![
        Product::new(
            1,
            "Sports T-Shirt",
            "Breathable cotton t-shirt for sports and workouts",
            29.99,
            "Apparel",
        ),
        Product::new(
            2,
            "Wireless Bluetooth Headphones",
            "Over-ear wireless bluetooth headphones with deep bass",
            129.0,
            "Audio",
        ),
    ]
}

fn service(dir: &TempDir, client: Arc<ScriptedClient>) -> AgentService {
    let config = RetrievalConfig::new(dir.path()).with_backend(EmbeddingBackend::OfflineHash);
    let engine = Arc::new(RecommendationEngine::new(
        config,
        Arc::new(InMemoryCatalog::with_products(sample_products())),
        client.clone(),
    ));
    AgentService::new(client, engine)
}

fn text_of(message: &ChatMessage) -> &str {
    message
        .content
        .as_ref()
        .and_then(|c| c.as_text())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_direct_answer_makes_single_call_with_tools_attached() {
    let dir = TempDir::new().unwrap();
    let client = ScriptedClient::new(vec![answer("I'm your shopping assistant.")]);
    let service = service(&dir, client.clone());

    let reply = service.generate_response("What's your name?", &[]).await;

    assert_eq!(reply.response, "I'm your shopping assistant.");
    assert!(reply.tool_calls.is_empty());

    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    let intent = &requests[0];
    assert_eq!(intent.tools.as_ref().map(Vec::len), Some(2));
    assert_eq!(intent.tool_choice.as_deref(), Some("auto"));
    assert_eq!(intent.max_tokens, Some(500));
    assert_eq!(intent.messages[0].role, Role::System);
    assert_eq!(text_of(intent.messages.last().unwrap()), "What's your name?");
}

#[tokio::test]
async fn test_tool_turn_executes_and_synthesizes() {
    let dir = TempDir::new().unwrap();
    let client = ScriptedClient::new(vec![
        tool_intent(vec![(
            "call_1",
            "recommend_products",
            r#"{"user_preferences": "sports t-shirt for workouts"}"#,
        )]),
        answer("I recommend the Sports T-Shirt for you."),
    ]);
    let service = service(&dir, client.clone());

    let reply = service
        .generate_response("Recommend me a t-shirt for sports.", &[])
        .await;

    assert_eq!(reply.response, "I recommend the Sports T-Shirt for you.");
    assert_eq!(reply.tool_calls.len(), 1);
    let invocation = &reply.tool_calls[0];
    assert_eq!(invocation.function, "recommend_products");
    assert_eq!(
        invocation.arguments["user_preferences"],
        "sports t-shirt for workouts"
    );
    assert_eq!(invocation.result[0]["name"], "Sports T-Shirt");

    let requests = client.requests();
    assert_eq!(requests.len(), 2);

    // Synthesis call: no tools, tool result tagged with its call id, then
    // the synthesis instruction last.
    let synthesis = &requests[1];
    assert!(synthesis.tools.is_none());
    let tool_message = synthesis
        .messages
        .iter()
        .find(|m| m.role == Role::Tool)
        .unwrap();
    assert_eq!(tool_message.tool_call_id.as_deref(), Some("call_1"));
    assert_eq!(tool_message.name.as_deref(), Some("recommend_products"));
    let last = synthesis.messages.last().unwrap();
    assert_eq!(last.role, Role::System);
    assert!(text_of(last).contains("tool results"));
}

#[tokio::test]
async fn test_unknown_tool_completes_turn_with_structured_error() {
    let dir = TempDir::new().unwrap();
    let client = ScriptedClient::new(vec![
        tool_intent(vec![("call_1", "order_pizza", r#"{"size": "large"}"#)]),
        answer("I can only help with product recommendations."),
    ]);
    let service = service(&dir, client.clone());

    let reply = service.generate_response("Order me a pizza", &[]).await;

    assert_eq!(reply.response, "I can only help with product recommendations.");
    assert_eq!(reply.tool_calls.len(), 1);
    assert_eq!(
        reply.tool_calls[0].result["error"],
        "Unknown function: order_pizza"
    );
}

#[tokio::test]
async fn test_tool_results_preserve_request_order() {
    let dir = TempDir::new().unwrap();
    let client = ScriptedClient::new(vec![
        tool_intent(vec![
            (
                "call_1",
                "recommend_products",
                r#"{"user_preferences": "sports shirt"}"#,
            ),
            ("call_2", "order_pizza", "{}"),
        ]),
        answer("Here you go."),
    ]);
    let service = service(&dir, client.clone());

    let reply = service.generate_response("shirt and pizza", &[]).await;

    assert_eq!(reply.tool_calls.len(), 2);
    assert_eq!(reply.tool_calls[0].function, "recommend_products");
    assert_eq!(reply.tool_calls[1].function, "order_pizza");

    let synthesis = &client.requests()[1];
    let tool_ids: Vec<&str> = synthesis
        .messages
        .iter()
        .filter(|m| m.role == Role::Tool)
        .filter_map(|m| m.tool_call_id.as_deref())
        .collect();
    assert_eq!(tool_ids, vec!["call_1", "call_2"]);
}

#[tokio::test]
async fn test_intent_failure_yields_apology() {
    let dir = TempDir::new().unwrap();
    let client = ScriptedClient::new(vec![failure()]);
    let service = service(&dir, client);

    let reply = service.generate_response("hello?", &[]).await;

    assert_eq!(
        reply.response,
        "Sorry, I cannot process your request right now. Please try again later."
    );
    assert!(reply.tool_calls.is_empty());
}

#[tokio::test]
async fn test_synthesis_failure_yields_apology() {
    let dir = TempDir::new().unwrap();
    let client = ScriptedClient::new(vec![
        tool_intent(vec![(
            "call_1",
            "recommend_products",
            r#"{"user_preferences": "shirt"}"#,
        )]),
        failure(),
    ]);
    let service = service(&dir, client);

    let reply = service.generate_response("shirt?", &[]).await;

    assert_eq!(
        reply.response,
        "Sorry, I cannot process your request right now. Please try again later."
    );
    assert!(reply.tool_calls.is_empty());
}

#[tokio::test]
async fn test_history_turns_flow_into_prompt() {
    let dir = TempDir::new().unwrap();
    let client = ScriptedClient::new(vec![answer("Sure.")]);
    let service = service(&dir, client.clone());

    let history = vec![
        ConversationTurn::new(Role::User, "I like running"),
        ConversationTurn::new(Role::Assistant, "Noted!"),
    ];
    service.generate_response("Any shoes?", &history).await;

    let intent = &client.requests()[0];
    let texts: Vec<&str> = intent.messages.iter().map(text_of).collect();
    assert!(texts.contains(&"I like running"));
    assert!(texts.contains(&"Noted!"));
    assert_eq!(*texts.last().unwrap(), "Any shoes?");
}

#[tokio::test]
async fn test_budget_filter_flows_through_tool_call() {
    let dir = TempDir::new().unwrap();
    let client = ScriptedClient::new(vec![
        tool_intent(vec![(
            "call_1",
            "recommend_products",
            r#"{"user_preferences": "headphones with deep bass", "budget": 50.0}"#,
        )]),
        answer("Nothing in budget, sorry."),
    ]);
    let service = service(&dir, client);

    let reply = service
        .generate_response("headphones under 50?", &[])
        .await;

    // The headphones cost 129.0, so the budget filter leaves nothing.
    assert_eq!(reply.tool_calls.len(), 1);
    assert_eq!(reply.tool_calls[0].result, serde_json::json!([]));
}

#[tokio::test]
async fn test_rebuild_index_counts_catalog_items() {
    let dir = TempDir::new().unwrap();
    let client = ScriptedClient::new(vec![]);
    let service = service(&dir, client);

    let indexed = service.rebuild_index().await.unwrap();
    assert_eq!(indexed, 2);
}
