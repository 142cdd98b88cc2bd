//! Orchestration Loop
//!
//! Drives a conversation through the completion service until the model
//! answers without asking for tools, or the turn budget runs out.
//!
//! ```text
//! AwaitingInput ──▶ RequestingCompletion ──▶ Done
//!                        ▲        │
//!                        │        ▼
//!                        └── ExecutingTools
//! ```
//!
//! Tool calls within one assistant message run strictly in the order the
//! model emitted them, one at a time.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{AgentError, Result};
use crate::message::{Conversation, Message, ToolCallRequest};
use crate::provider::{Completion, GenerationOptions, LlmProvider};
use crate::resolver::resolve;
use crate::session::Session;
use crate::tool::{Tool, ToolRegistry, ToolResult, ToolSchema};

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// System prompt seeded into every new conversation
    pub system_prompt: String,

    /// Maximum completion requests per input before giving up
    pub max_turns: usize,

    /// Generation options
    pub generation: GenerationOptions,

    /// Deadline applied separately to each completion request and each tool execution
    pub call_timeout: Option<Duration>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_turns: 10,
            generation: GenerationOptions::default(),
            call_timeout: None,
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. \
Use the provided tools whenever they can answer part of the question more reliably than you can. \
For all other questions, answer directly.";

/// Input for one call into the agent
#[derive(Clone, Debug)]
pub enum AgentInput {
    /// A new user message
    Text(String),

    /// Results for tool calls executed outside the agent, when re-entering mid-turn
    ToolResults(Vec<PendingToolResult>),
}

impl From<&str> for AgentInput {
    fn from(text: &str) -> Self {
        AgentInput::Text(text.to_string())
    }
}

impl From<String> for AgentInput {
    fn from(text: String) -> Self {
        AgentInput::Text(text)
    }
}

/// A tool result produced by the caller rather than by a registered tool
#[derive(Clone, Debug)]
pub struct PendingToolResult {
    pub call_id: Option<String>,
    pub tool_name: Option<String>,
    pub result: ToolResult,
}

/// How a run ended
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AgentOutcome {
    /// The model answered without requesting tools
    Answer { content: String, turns: usize },

    /// `max_turns` completions were spent without a final answer
    BudgetExhausted {
        turns: usize,
        last_content: Option<String>,
    },
}

impl AgentOutcome {
    /// Final answer text, if the run produced one
    pub fn answer(&self) -> Option<&str> {
        match self {
            AgentOutcome::Answer { content, .. } => Some(content),
            AgentOutcome::BudgetExhausted { .. } => None,
        }
    }

    /// Completion requests made during the run
    pub fn turns(&self) -> usize {
        match self {
            AgentOutcome::Answer { turns, .. } | AgentOutcome::BudgetExhausted { turns, .. } => {
                *turns
            }
        }
    }

    pub fn is_budget_exhausted(&self) -> bool {
        matches!(self, AgentOutcome::BudgetExhausted { .. })
    }
}

enum LoopState {
    AwaitingInput(AgentInput),
    RequestingCompletion,
    ExecutingTools(Vec<ToolCallRequest>),
    Done(AgentOutcome),
}

/// The main Agent struct
///
/// Holds no conversation state of its own; one agent can serve any number
/// of independent [`Conversation`]s.
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    /// Create with default configuration
    pub fn with_defaults(provider: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>) -> Self {
        Self::new(provider, tools, AgentConfig::default())
    }

    /// Start a conversation seeded with the configured system prompt
    pub fn new_conversation(&self) -> Conversation {
        Conversation::with_system_prompt(self.config.system_prompt.clone())
    }

    /// Start a session seeded with the configured system prompt
    pub fn new_session(&self) -> Session {
        let mut session = Session::with_system_prompt(self.config.system_prompt.clone());
        session.metadata.model.clone_from(&self.config.generation.model);
        session
    }

    /// Run the loop for one input.
    ///
    /// Errors only when the completion service fails; tool failures and
    /// unresolvable tool calls are reported back to the model instead.
    pub async fn run(
        &self,
        conversation: &mut Conversation,
        input: impl Into<AgentInput>,
    ) -> Result<AgentOutcome> {
        let schemas = self.tools.schemas();
        let mut turns = 0;
        let mut state = LoopState::AwaitingInput(input.into());

        loop {
            state = match state {
                LoopState::AwaitingInput(input) => {
                    Self::accept_input(conversation, input);
                    LoopState::RequestingCompletion
                }
                LoopState::RequestingCompletion => {
                    if turns >= self.config.max_turns {
                        warn!(max_turns = self.config.max_turns, "Turn budget exhausted");
                        LoopState::Done(AgentOutcome::BudgetExhausted {
                            turns,
                            last_content: conversation
                                .last_assistant_content()
                                .filter(|c| !c.trim().is_empty())
                                .map(str::to_string),
                        })
                    } else {
                        turns += 1;
                        let completion = self.request_completion(conversation, &schemas).await?;
                        let message = completion.message;
                        let tool_calls = message.tool_calls.clone();
                        let content = message.content.clone();
                        conversation.push(message);

                        if tool_calls.is_empty() {
                            info!(turn = turns, "Agent produced final answer");
                            LoopState::Done(AgentOutcome::Answer { content, turns })
                        } else {
                            debug!(turn = turns, calls = tool_calls.len(), "Model requested tools");
                            LoopState::ExecutingTools(tool_calls)
                        }
                    }
                }
                LoopState::ExecutingTools(calls) => {
                    for call in &calls {
                        let message = self.execute_call(call).await;
                        conversation.push(message);
                    }
                    LoopState::RequestingCompletion
                }
                LoopState::Done(outcome) => return Ok(outcome),
            };
        }
    }

    /// Run with a simple string input (creates temporary conversation)
    pub async fn ask(&self, question: &str) -> Result<AgentOutcome> {
        let mut conversation = self.new_conversation();
        self.run(&mut conversation, question).await
    }

    fn accept_input(conversation: &mut Conversation, input: AgentInput) {
        match input {
            AgentInput::Text(text) => conversation.push(Message::user(text)),
            AgentInput::ToolResults(results) => {
                for pending in results {
                    conversation.push(Message::tool(
                        &pending.result,
                        pending.call_id,
                        pending.tool_name,
                    ));
                }
            }
        }
    }

    async fn request_completion(
        &self,
        conversation: &Conversation,
        schemas: &[ToolSchema],
    ) -> Result<Completion> {
        let request =
            self.provider
                .complete(conversation.messages(), schemas, &self.config.generation);

        with_deadline(self.config.call_timeout, request)
            .await
            .map_err(|limit| {
                warn!(provider = self.provider.name(), ?limit, "Completion timed out");
                AgentError::Timeout(limit)
            })?
    }

    /// Resolve and run one tool call, producing the tool message to append
    async fn execute_call(&self, call: &ToolCallRequest) -> Message {
        let (name, result) = match resolve(&self.tools, call) {
            Ok(resolved) => {
                debug!(
                    tool = %resolved.name,
                    requested = %call.name,
                    rule = %resolved.rule,
                    adapted = resolved.adapted,
                    "Executing tool"
                );
                let result = self
                    .run_tool(&resolved.name, resolved.tool.as_ref(), &resolved.arguments)
                    .await;
                (Some(resolved.name), result)
            }
            Err(unresolved) => {
                warn!(requested = %call.name, reason = %unresolved.reason, "Could not resolve tool call");
                let name = (!call.name.is_empty()).then(|| call.name.clone());
                (name, ToolResult::error(unresolved.to_string()))
            }
        };

        if let ToolResult::Error(message) = &result {
            debug!(call_id = ?call.id, error = %message, "Tool call failed");
        }

        Message::tool(&result, call.id.clone(), name)
    }

    async fn run_tool(
        &self,
        name: &str,
        tool: &dyn Tool,
        arguments: &crate::message::Arguments,
    ) -> ToolResult {
        with_deadline(self.config.call_timeout, tool.execute(arguments))
            .await
            .unwrap_or_else(|limit| {
                warn!(tool = name, ?limit, "Tool execution timed out");
                ToolResult::error(format!("Tool '{name}' timed out after {limit:?}"))
            })
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get the provider
    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    /// Get configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}

async fn with_deadline<F: Future>(
    limit: Option<Duration>,
    future: F,
) -> std::result::Result<F::Output, Duration> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, future)
            .await
            .map_err(|_| limit),
        None => Ok(future.await),
    }
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: Vec<Arc<dyn Tool>>,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: Vec::new(),
            config: AgentConfig::default(),
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.push(Arc::new(tool));
        self
    }

    pub fn shared_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = temp;
        self
    }

    pub fn max_turns(mut self, max: usize) -> Self {
        self.config.max_turns = max;
        self
    }

    pub fn call_timeout(mut self, limit: Duration) -> Self {
        self.config.call_timeout = Some(limit);
        self
    }

    /// Build the agent, registering tools in the order they were added
    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        if self.config.max_turns == 0 {
            return Err(AgentError::Config("max_turns must be at least 1".into()));
        }

        let tools = ToolRegistry::from_tools(self.tools)?;
        Ok(Agent::new(provider, Arc::new(tools), self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Arguments, Role};
    use crate::testing::ScriptedProvider;
    use crate::tool::tests::EchoTool;
    use async_trait::async_trait;
    use serde_json::{Value, json};

    fn args(value: Value) -> Arguments {
        match value {
            Value::Object(map) => map,
            _ => Arguments::new(),
        }
    }

    fn call(id: &str, name: &str, arguments: Value) -> ToolCallRequest {
        ToolCallRequest::new(name, args(arguments)).with_id(id)
    }

    fn agent(provider: &Arc<ScriptedProvider>, max_turns: usize) -> Agent {
        AgentBuilder::new()
            .provider(provider.clone())
            .tool(EchoTool::new("echo", &["text"]))
            .max_turns(max_turns)
            .build()
            .unwrap()
    }

    /// Sleeps longer than any test deadline
    struct SlowTool;

    #[async_trait]
    impl Tool for SlowTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema::new("slow", "Never finishes in time")
        }

        async fn execute(&self, _arguments: &Arguments) -> ToolResult {
            tokio::time::sleep(Duration::from_secs(30)).await;
            ToolResult::ok(json!("too late"))
        }
    }

    #[tokio::test]
    async fn test_answer_without_tools() {
        let provider = Arc::new(ScriptedProvider::new().reply("Paris is the capital."));
        let agent = agent(&provider, 5);
        let mut conversation = agent.new_conversation();

        let outcome = agent.run(&mut conversation, "Capital of France?").await.unwrap();

        assert_eq!(
            outcome,
            AgentOutcome::Answer {
                content: "Paris is the capital.".into(),
                turns: 1
            }
        );
        assert_eq!(provider.call_count(), 1);
        let roles: Vec<Role> = conversation.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, [Role::System, Role::User, Role::Assistant]);
    }

    #[tokio::test]
    async fn test_tool_round_trip() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .tool_calls("", vec![call("call_1", "echo", json!({"text": "hi"}))])
                .reply("Echoed."),
        );
        let agent = agent(&provider, 5);
        let mut conversation = agent.new_conversation();

        let outcome = agent.run(&mut conversation, "Say hi").await.unwrap();
        assert_eq!(outcome.answer(), Some("Echoed."));
        assert_eq!(outcome.turns(), 2);

        let tool_msg = &conversation.messages()[3];
        assert_eq!(tool_msg.role, Role::Tool);
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(tool_msg.name.as_deref(), Some("echo"));
        assert_eq!(tool_msg.content, r#"{"result":{"text":"hi"}}"#);

        // Second request replays the whole log and resends the schemas
        let requests = provider.requests();
        assert_eq!(requests[1].messages.len(), 4);
        assert_eq!(requests[0].tools, ["echo"]);
        assert_eq!(requests[1].tools, ["echo"]);
    }

    #[tokio::test]
    async fn test_tool_calls_run_in_order() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .tool_calls(
                    "",
                    vec![
                        call("a", "echo", json!({"text": "first"})),
                        call("b", "echo", json!({"text": "second"})),
                        call("c", "echo", json!({"text": "third"})),
                    ],
                )
                .reply("done"),
        );
        let agent = agent(&provider, 5);
        let mut conversation = agent.new_conversation();
        agent.run(&mut conversation, "go").await.unwrap();

        let ids: Vec<&str> = conversation
            .messages()
            .iter()
            .filter(|m| m.role == Role::Tool)
            .filter_map(|m| m.tool_call_id.as_deref())
            .collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_unresolved_call_is_reported_to_model() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .tool_calls("", vec![call("x", "weather", json!({"city": "Oslo"}))])
                .reply("Sorry, I cannot check the weather."),
        );
        let agent = agent(&provider, 5);
        let mut conversation = agent.new_conversation();

        let outcome = agent.run(&mut conversation, "Weather?").await.unwrap();
        assert_eq!(outcome.answer(), Some("Sorry, I cannot check the weather."));

        let tool_msg = &conversation.messages()[3];
        let content: Value = serde_json::from_str(&tool_msg.content).unwrap();
        assert!(content["error"].as_str().unwrap().contains("weather"));
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn test_budget_exhausted_after_one_turn() {
        let looping = Message::assistant_with_tool_calls(
            "Let me check.",
            vec![call("1", "echo", json!({"text": "again"}))],
        );
        let provider = Arc::new(ScriptedProvider::new().repeat(looping));
        let agent = agent(&provider, 1);
        let mut conversation = agent.new_conversation();

        let outcome = agent.run(&mut conversation, "loop").await.unwrap();

        assert_eq!(provider.call_count(), 1);
        assert_eq!(
            outcome,
            AgentOutcome::BudgetExhausted {
                turns: 1,
                last_content: Some("Let me check.".into())
            }
        );
    }

    #[tokio::test]
    async fn test_turns_never_exceed_budget() {
        let looping = Message::assistant_with_tool_calls(
            "",
            vec![call("1", "echo", json!({"text": "again"}))],
        );
        for max_turns in 1..=4 {
            let provider = Arc::new(ScriptedProvider::new().repeat(looping.clone()));
            let agent = agent(&provider, max_turns);

            let outcome = agent.ask("loop").await.unwrap();
            assert!(outcome.is_budget_exhausted());
            assert_eq!(outcome.turns(), max_turns);
            assert_eq!(provider.call_count(), max_turns);
        }
    }

    #[tokio::test]
    async fn test_provider_error_is_terminal() {
        let provider = Arc::new(ScriptedProvider::new().fail("connection refused"));
        let agent = agent(&provider, 5);

        let err = agent.ask("hello").await.unwrap_err();
        assert!(err.is_inference_failure());
    }

    #[tokio::test]
    async fn test_re_entry_with_tool_results() {
        let provider = Arc::new(ScriptedProvider::new().reply("The build passed."));
        let agent = agent(&provider, 5);
        let mut conversation = agent.new_conversation();

        let input = AgentInput::ToolResults(vec![PendingToolResult {
            call_id: Some("ext_1".into()),
            tool_name: Some("ci_status".into()),
            result: ToolResult::ok(json!("green")),
        }]);
        let outcome = agent.run(&mut conversation, input).await.unwrap();

        assert_eq!(outcome.answer(), Some("The build passed."));
        let sent = &provider.requests()[0].messages;
        assert_eq!(sent[1].role, Role::Tool);
        assert_eq!(sent[1].content, r#"{"result":"green"}"#);
    }

    #[tokio::test]
    async fn test_tool_timeout_becomes_error_result() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .tool_calls("", vec![call("s", "slow", json!({}))])
                .reply("It timed out."),
        );
        let agent = AgentBuilder::new()
            .provider(provider.clone())
            .tool(SlowTool)
            .call_timeout(Duration::from_millis(20))
            .build()
            .unwrap();
        let mut conversation = agent.new_conversation();

        let outcome = agent.run(&mut conversation, "slow please").await.unwrap();
        assert_eq!(outcome.answer(), Some("It timed out."));
        assert!(conversation.messages()[3].content.contains("timed out"));
    }

    #[test]
    fn test_builder_validation() {
        assert!(matches!(
            AgentBuilder::new().build(),
            Err(AgentError::Config(_))
        ));

        let provider: Arc<dyn LlmProvider> = Arc::new(ScriptedProvider::new());
        assert!(matches!(
            AgentBuilder::new().provider(provider.clone()).max_turns(0).build(),
            Err(AgentError::Config(_))
        ));
        assert!(matches!(
            AgentBuilder::new()
                .provider(provider)
                .tool(EchoTool::new("echo", &["text"]))
                .tool(EchoTool::new("echo", &["other"]))
                .build(),
            Err(AgentError::DuplicateToolName(_))
        ));
    }
}
