//! Tool Call Resolution
//!
//! Maps an untrusted [`ToolCallRequest`] onto a registered tool and a set of
//! arguments that satisfy its schema. Rules are tried in a fixed order:
//!
//! 1. **Exact name** - the declared name is registered. Never falls through,
//!    even when the arguments are rejected.
//! 2. **Single-tool fallback** - exactly one tool is registered.
//! 3. **Argument shape** - the first tool, in registration order, whose
//!    required parameters intersect the supplied argument keys.
//!
//! Whichever tool is selected, its arguments are first validated as-is and
//! then, failing that, passed through the tool's own `adapt_arguments` rule.
//! Resolution is a pure function of the registry and the request.

use std::sync::Arc;

use crate::error::UnresolvedToolCall;
use crate::message::{Arguments, ToolCallRequest};
use crate::tool::{RegisteredTool, Tool, ToolRegistry};

/// Which rule selected the tool
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolutionRule {
    ExactName,
    SingleToolFallback,
    ArgumentShape,
}

impl std::fmt::Display for ResolutionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionRule::ExactName => write!(f, "exact_name"),
            ResolutionRule::SingleToolFallback => write!(f, "single_tool_fallback"),
            ResolutionRule::ArgumentShape => write!(f, "argument_shape"),
        }
    }
}

/// A tool call ready to execute
#[derive(Clone)]
pub struct ResolvedCall {
    /// Registered name of the selected tool
    pub name: String,

    pub tool: Arc<dyn Tool>,

    /// Arguments that passed schema validation
    pub arguments: Arguments,

    pub rule: ResolutionRule,

    /// Whether the tool's adaptation rule rewrote the arguments
    pub adapted: bool,
}

impl std::fmt::Debug for ResolvedCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedCall")
            .field("name", &self.name)
            .field("arguments", &self.arguments)
            .field("rule", &self.rule)
            .field("adapted", &self.adapted)
            .finish_non_exhaustive()
    }
}

/// Resolve a model-declared tool call against the registry
pub fn resolve(
    registry: &ToolRegistry,
    request: &ToolCallRequest,
) -> Result<ResolvedCall, UnresolvedToolCall> {
    if registry.is_empty() {
        return Err(UnresolvedToolCall::new(request, "no tools are registered"));
    }

    if !request.name.is_empty() {
        if let Some(entry) = registry.get(&request.name) {
            return select(entry, request, ResolutionRule::ExactName);
        }
    }

    if let [only] = registry.entries() {
        return select(only, request, ResolutionRule::SingleToolFallback);
    }

    registry
        .entries()
        .iter()
        .find(|entry| {
            entry
                .schema()
                .required()
                .any(|param| request.arguments.contains_key(param))
        })
        .map_or_else(
            || {
                Err(UnresolvedToolCall::new(
                    request,
                    "no registered tool matches the supplied arguments",
                ))
            },
            |entry| select(entry, request, ResolutionRule::ArgumentShape),
        )
}

impl ToolRegistry {
    /// Resolve a tool call against this registry
    pub fn resolve(&self, request: &ToolCallRequest) -> Result<ResolvedCall, UnresolvedToolCall> {
        resolve(self, request)
    }
}

fn select(
    entry: &RegisteredTool,
    request: &ToolCallRequest,
    rule: ResolutionRule,
) -> Result<ResolvedCall, UnresolvedToolCall> {
    let schema = entry.schema();
    let (arguments, adapted) = match schema.validate(&request.arguments) {
        Ok(()) => (request.arguments.clone(), false),
        Err(err) => {
            let adapted = entry
                .tool()
                .adapt_arguments(&request.arguments)
                .ok_or_else(|| {
                    UnresolvedToolCall::new(request, format!("{}: {err}", schema.name))
                })?;
            schema.validate(&adapted).map_err(|err| {
                UnresolvedToolCall::new(
                    request,
                    format!("{}: adapted arguments rejected: {err}", schema.name),
                )
            })?;
            (adapted, true)
        }
    };

    Ok(ResolvedCall {
        name: schema.name.clone(),
        tool: Arc::clone(entry.tool()),
        arguments,
        rule,
        adapted,
    })
}
