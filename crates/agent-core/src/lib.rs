//! # agent-core
//!
//! Tool-use orchestration loop with a provider-agnostic LLM abstraction.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                            Agent                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌───────────────────────┐   │
//! │  │ Orchestration│  │   Resolver   │  │     LlmProvider       │   │
//! │  │     Loop     │──│ + Registry   │  │     (Strategy)        │   │
//! │  └──────┬───────┘  └──────────────┘  └───────────────────────┘   │
//! │         │ owns one per session                                   │
//! │  ┌──────▼───────┐                                                │
//! │  │ Conversation │  append-only, replayed every turn              │
//! │  └──────────────┘                                                │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait enables swapping between Ollama, OpenAI, Anthropic,
//! or any other provider without changing agent logic. Model tool calls are
//! mapped onto registered tools by [`resolver::resolve`], which tolerates
//! empty or mismatched tool names.

pub mod error;
pub mod message;
pub mod provider;
pub mod reasoning;
pub mod resolver;
pub mod session;
pub mod tool;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{AgentError, Result, UnresolvedToolCall};
pub use message::{Arguments, Conversation, Message, Role, ToolCallRequest};
pub use provider::{GenerationOptions, LlmProvider};
pub use reasoning::{Agent, AgentBuilder, AgentConfig, AgentInput, AgentOutcome, PendingToolResult};
pub use resolver::{ResolutionRule, ResolvedCall};
pub use session::{Session, SessionId, SessionLimits, SessionStore};
pub use tool::{ParameterSchema, Tool, ToolRegistry, ToolResult, ToolSchema};
