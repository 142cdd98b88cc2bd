//! End-to-end runs of the orchestration loop with the built-in tools and a
//! scripted model.

use std::sync::Arc;

use agent_core::testing::ScriptedProvider;
use agent_core::{AgentBuilder, Arguments, Message, Role, ToolCallRequest};
use agent_tools::market::StaticMarketData;
use agent_tools::search::SearchClient;
use agent_tools::tools::{CalculatorTool, MarketDataTool, WebSearchTool};
use agent_tools::{Result, SearchHit};
use async_trait::async_trait;
use serde_json::{Value, json};

struct OfflineSearch;

#[async_trait]
impl SearchClient for OfflineSearch {
    async fn search(&self, query: &str, _limit: usize) -> Result<Vec<SearchHit>> {
        Ok(vec![SearchHit {
            title: format!("About {query}"),
            url: "https://example.com".into(),
            snippet: String::new(),
        }])
    }

    fn name(&self) -> &str {
        "offline"
    }
}

fn args(value: Value) -> Arguments {
    value.as_object().cloned().unwrap()
}

fn tool_messages(messages: &[Message]) -> Vec<&Message> {
    messages.iter().filter(|m| m.role == Role::Tool).collect()
}

#[tokio::test]
async fn test_unnamed_call_falls_back_to_only_tool() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .tool_calls("", vec![ToolCallRequest::new("", args(json!({"expression": "2+2"})))])
            .reply("2 + 2 = 4"),
    );
    let agent = AgentBuilder::new()
        .provider(provider.clone())
        .tool(CalculatorTool::new())
        .build()
        .unwrap();

    let mut conversation = agent.new_conversation();
    let outcome = agent.run(&mut conversation, "What is 2+2?").await.unwrap();

    assert_eq!(outcome.answer(), Some("2 + 2 = 4"));
    let tools = tool_messages(conversation.messages());
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].content, r#"{"result":4}"#);
    assert_eq!(tools[0].name.as_deref(), Some("calculator"));
}

#[tokio::test]
async fn test_misnamed_call_with_adapted_arguments() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .tool_calls(
                "",
                vec![
                    ToolCallRequest::new("calc", args(json!({"num1": 3, "num2": 4})))
                        .with_id("call_1"),
                ],
            )
            .reply("The product is 12."),
    );
    let agent = AgentBuilder::new()
        .provider(provider.clone())
        .tool(CalculatorTool::new())
        .build()
        .unwrap();

    let mut conversation = agent.new_conversation();
    agent.run(&mut conversation, "3 times 4?").await.unwrap();

    let tools = tool_messages(conversation.messages());
    assert_eq!(tools[0].content, r#"{"result":12}"#);
    assert_eq!(tools[0].tool_call_id.as_deref(), Some("call_1"));

    // The second request carries the tool result back to the model
    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[1].messages.last().map(|m| m.role),
        Some(Role::Tool)
    );
}

#[tokio::test]
async fn test_plain_reply_ends_loop_unchanged() {
    let provider = Arc::new(ScriptedProvider::new().reply("Paris is the capital of France."));
    let agent = AgentBuilder::new()
        .provider(provider.clone())
        .tool(CalculatorTool::new())
        .build()
        .unwrap();

    let outcome = agent.ask("Capital of France?").await.unwrap();

    assert_eq!(outcome.answer(), Some("Paris is the capital of France."));
    assert_eq!(outcome.turns(), 1);
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_budget_of_one_turn() {
    let provider = Arc::new(ScriptedProvider::new().repeat(Message::assistant_with_tool_calls(
        "",
        vec![ToolCallRequest::new("calculator", args(json!({"expression": "1+1"})))],
    )));
    let agent = AgentBuilder::new()
        .provider(provider.clone())
        .tool(CalculatorTool::new())
        .max_turns(1)
        .build()
        .unwrap();

    let outcome = agent.ask("Keep calculating").await.unwrap();

    assert!(outcome.is_budget_exhausted());
    assert_eq!(outcome.turns(), 1);
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_argument_shape_picks_matching_tool() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .tool_calls(
                "",
                vec![
                    ToolCallRequest::new("lookup", args(json!({"tickers": ["NVDA"]}))),
                    ToolCallRequest::new("find", args(json!({"query": "ai news"}))),
                ],
            )
            .reply("NVIDIA is up today."),
    );
    let agent = AgentBuilder::new()
        .provider(provider.clone())
        .tool(CalculatorTool::new())
        .tool(WebSearchTool::new(Arc::new(OfflineSearch)))
        .tool(MarketDataTool::new(Arc::new(StaticMarketData::new())))
        .build()
        .unwrap();

    let mut conversation = agent.new_conversation();
    agent.run(&mut conversation, "AI news and NVDA?").await.unwrap();

    let tools = tool_messages(conversation.messages());
    assert_eq!(tools.len(), 2);
    assert_eq!(tools[0].name.as_deref(), Some("market_data"));
    assert_eq!(tools[1].name.as_deref(), Some("web_search"));

    let quote: Value = serde_json::from_str(&tools[0].content).unwrap();
    assert_eq!(quote, json!({"result": {"NVDA": "$181.50 (+2.31%)"}}));

    // Every request advertises all three tools in registration order
    assert_eq!(
        provider.requests()[0].tools,
        vec!["calculator", "web_search", "market_data"]
    );
}

#[tokio::test]
async fn test_unresolvable_call_is_reported_to_model() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .tool_calls("", vec![ToolCallRequest::new("weather", args(json!({"city": "Oslo"})))])
            .reply("I can't check the weather."),
    );
    let agent = AgentBuilder::new()
        .provider(provider.clone())
        .tool(CalculatorTool::new())
        .tool(MarketDataTool::new(Arc::new(StaticMarketData::new())))
        .build()
        .unwrap();

    let mut conversation = agent.new_conversation();
    let outcome = agent.run(&mut conversation, "Weather in Oslo?").await.unwrap();

    assert_eq!(outcome.answer(), Some("I can't check the weather."));
    let tools = tool_messages(conversation.messages());
    let content: Value = serde_json::from_str(&tools[0].content).unwrap();
    assert!(content["error"].as_str().unwrap().contains("weather"));
}
