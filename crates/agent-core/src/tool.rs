//! Tool System
//!
//! Extensible tool framework for agent capabilities.
//! Tools are registered once per agent and invoked by the orchestration loop
//! after [`crate::resolver`] has mapped a model tool call onto one of them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AgentError, Result};
use crate::message::Arguments;

/// Result from tool execution
///
/// Serializes as `{"result": value}` or `{"error": message}`, which is
/// exactly the content re-injected into the conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ToolResult {
    #[serde(rename = "result")]
    Ok(Value),

    #[serde(rename = "error")]
    Error(String),
}

impl ToolResult {
    pub fn ok(value: impl Into<Value>) -> Self {
        ToolResult::Ok(value.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        ToolResult::Error(message.into())
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ToolResult::Ok(_))
    }

    /// Structured form used for the tool message content
    pub fn to_value(&self) -> Value {
        match self {
            ToolResult::Ok(value) => json!({ "result": value }),
            ToolResult::Error(message) => json!({ "error": message }),
        }
    }
}

/// JSON Schema type check; unknown type names accept anything
fn type_matches(param_type: &str, value: &Value) -> bool {
    match param_type {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        _ => true,
    }
}

/// Parameter definition for tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, number, integer, boolean, object, array)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,

    /// Default value if not provided
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Enum of allowed values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,

    /// Element type for array parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<String>,
}

impl ParameterSchema {
    /// Optional parameter
    pub fn new(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required: false,
            default: None,
            enum_values: None,
            items: None,
        }
    }

    /// Required parameter
    pub fn required(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            required: true,
            ..Self::new(name, param_type, description)
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_enum(mut self, values: Vec<Value>) -> Self {
        self.enum_values = Some(values);
        self
    }

    pub fn with_items(mut self, item_type: impl Into<String>) -> Self {
        self.items = Some(item_type.into());
        self
    }

    fn accepts(&self, value: &Value) -> bool {
        let items_ok = match (value, &self.items) {
            (Value::Array(elements), Some(item_type)) => {
                elements.iter().all(|e| type_matches(item_type, e))
            }
            _ => true,
        };
        type_matches(&self.param_type, value)
            && items_ok
            && self
                .enum_values
                .as_ref()
                .is_none_or(|allowed| allowed.contains(value))
    }

    fn to_property(&self) -> Value {
        let mut property = json!({
            "type": self.param_type,
            "description": self.description,
        });
        if let Some(items) = &self.items {
            property["items"] = json!({ "type": items });
        }
        if let Some(values) = &self.enum_values {
            property["enum"] = json!(values);
        }
        if let Some(default) = &self.default {
            property["default"] = default.clone();
        }
        property
    }
}

/// Tool definition schema (for LLM function calling)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to LLM)
    pub description: String,

    /// Parameter definitions, in declaration order
    pub parameters: Vec<ParameterSchema>,
}

impl ToolSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    pub fn param(mut self, param: ParameterSchema) -> Self {
        self.parameters.push(param);
        self
    }

    /// Names of required parameters
    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterSchema> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// JSON Schema for the arguments object
    pub fn input_schema(&self) -> Value {
        let properties: serde_json::Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| (p.name.clone(), p.to_property()))
            .collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": self.required().collect::<Vec<_>>(),
        })
    }

    /// Provider-neutral definition: `{name, description, input_schema}`
    pub fn to_definition(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "input_schema": self.input_schema(),
        })
    }

    /// Check arguments against this schema.
    ///
    /// Unknown keys are rejected so drift between the model and the schema
    /// surfaces immediately instead of being silently dropped.
    pub fn validate(&self, arguments: &Arguments) -> Result<()> {
        for (key, value) in arguments {
            let param = self.parameter(key).ok_or_else(|| {
                AgentError::ToolValidation(format!(
                    "Unknown parameter '{}' for tool '{}'",
                    key, self.name
                ))
            })?;
            if !param.accepts(value) {
                return Err(AgentError::ToolValidation(format!(
                    "Parameter '{}' expects {}, got {}",
                    key, param.param_type, value
                )));
            }
        }

        if let Some(missing) = self.required().find(|name| !arguments.contains_key(*name)) {
            return Err(AgentError::ToolValidation(format!(
                "Missing required parameter: {missing}"
            )));
        }

        Ok(())
    }
}

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's schema for LLM function calling
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with arguments already validated against `schema()`.
    ///
    /// Faults are reported as [`ToolResult::Error`], never propagated.
    async fn execute(&self, arguments: &Arguments) -> ToolResult;

    /// Rewrite arguments that don't match the schema into ones that do.
    ///
    /// Used when the model picked this tool by fallback rather than by name.
    /// Returns `None` when the tool has no rule for the given shape.
    fn adapt_arguments(&self, _arguments: &Arguments) -> Option<Arguments> {
        None
    }
}

/// A tool together with the schema captured at registration
pub struct RegisteredTool {
    schema: ToolSchema,
    tool: Arc<dyn Tool>,
}

impl RegisteredTool {
    pub fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    pub fn tool(&self) -> &Arc<dyn Tool> {
        &self.tool
    }
}

/// Registry for available tools, kept in registration order
#[derive(Default)]
pub struct ToolRegistry {
    entries: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from an ordered list of tools
    pub fn from_tools(tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Result<Self> {
        let mut registry = Self::new();
        for tool in tools {
            registry.register_arc(tool)?;
        }
        Ok(registry)
    }

    /// Register a new tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<()> {
        self.register_arc(Arc::new(tool))
    }

    /// Register a shared tool
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let schema = tool.schema();
        if self.index.contains_key(&schema.name) {
            return Err(AgentError::DuplicateToolName(schema.name));
        }
        self.index.insert(schema.name.clone(), self.entries.len());
        self.entries.push(RegisteredTool { schema, tool });
        Ok(())
    }

    /// Get a registered tool by exact name
    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    /// Look up a tool by exact name
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn Tool>> {
        self.get(name)
            .map(|entry| Arc::clone(&entry.tool))
            .ok_or_else(|| AgentError::ToolNotFound(name.to_string()))
    }

    /// All registered tools, in registration order
    pub fn entries(&self) -> &[RegisteredTool] {
        &self.entries
    }

    /// Get all tool schemas, in registration order
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.entries.iter().map(|e| e.schema.clone()).collect()
    }

    /// Get tool names, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.schema.name.as_str()).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal tool with a configurable schema, echoing its arguments back
    pub(crate) struct EchoTool {
        pub(crate) schema: ToolSchema,
    }

    impl EchoTool {
        pub(crate) fn new(name: &str, required: &[&str]) -> Self {
            let mut schema = ToolSchema::new(name, format!("Echo tool {name}"));
            for param in required {
                schema = schema.param(ParameterSchema::required(*param, "string", "input"));
            }
            Self { schema }
        }
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn schema(&self) -> ToolSchema {
            self.schema.clone()
        }

        async fn execute(&self, arguments: &Arguments) -> ToolResult {
            ToolResult::ok(Value::Object(arguments.clone()))
        }
    }

    fn args(value: Value) -> Arguments {
        match value {
            Value::Object(map) => map,
            _ => Arguments::new(),
        }
    }

    #[test]
    fn test_tool_registry() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool::new("alpha", &["a"])).unwrap();
        registry.register(EchoTool::new("beta", &["b"])).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.lookup("alpha").is_ok());
        assert!(registry.get("beta").is_some());
        assert!(matches!(
            registry.lookup("unknown"),
            Err(AgentError::ToolNotFound(name)) if name == "unknown"
        ));
    }

    #[test]
    fn test_schemas_keep_registration_order() {
        let names = ["zeta", "alpha", "mu", "beta"];
        let tools: Vec<Arc<dyn Tool>> = names
            .iter()
            .map(|n| Arc::new(EchoTool::new(n, &["x"])) as Arc<dyn Tool>)
            .collect();
        let registry = ToolRegistry::from_tools(tools).unwrap();

        let schema_names: Vec<String> = registry.schemas().into_iter().map(|s| s.name).collect();
        assert_eq!(schema_names, names);
        assert_eq!(registry.names(), names);
    }

    #[test]
    fn test_duplicate_tool_name_rejected() {
        let tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(EchoTool::new("calculator", &["expression"])),
            Arc::new(EchoTool::new("calculator", &["other"])),
        ];
        let err = ToolRegistry::from_tools(tools).err();
        assert!(matches!(err, Some(AgentError::DuplicateToolName(name)) if name == "calculator"));
    }

    #[test]
    fn test_validate_arguments() {
        let schema = ToolSchema::new("search", "Search")
            .param(ParameterSchema::required("query", "string", "Query"))
            .param(ParameterSchema::new("max_results", "integer", "Limit"));

        assert!(schema.validate(&args(json!({"query": "rust"}))).is_ok());
        assert!(schema.validate(&args(json!({"query": "rust", "max_results": 3}))).is_ok());
        assert!(schema.validate(&args(json!({}))).is_err());
        assert!(schema.validate(&args(json!({"query": 42}))).is_err());
        assert!(schema.validate(&args(json!({"query": "rust", "page": 2}))).is_err());
    }

    #[test]
    fn test_enum_values_enforced() {
        let schema = ToolSchema::new("fmt", "Format").param(
            ParameterSchema::required("style", "string", "Style")
                .with_enum(vec![json!("short"), json!("long")]),
        );
        assert!(schema.validate(&args(json!({"style": "short"}))).is_ok());
        assert!(schema.validate(&args(json!({"style": "medium"}))).is_err());
    }

    #[test]
    fn test_array_items_enforced() {
        let schema = ToolSchema::new("quotes", "Quotes")
            .param(ParameterSchema::required("tickers", "array", "Tickers").with_items("string"));

        assert!(schema.validate(&args(json!({"tickers": ["NVDA", "GOOG"]}))).is_ok());
        assert!(schema.validate(&args(json!({"tickers": [1, 2]}))).is_err());
        assert!(schema.validate(&args(json!({"tickers": ["NVDA", 2]}))).is_err());
    }

    #[test]
    fn test_definition_shape() {
        let schema = ToolSchema::new("calculator", "Evaluate arithmetic")
            .param(ParameterSchema::required("expression", "string", "Expression"));
        let def = schema.to_definition();

        assert_eq!(def["name"], "calculator");
        assert_eq!(def["input_schema"]["type"], "object");
        assert_eq!(def["input_schema"]["properties"]["expression"]["type"], "string");
        assert_eq!(def["input_schema"]["required"], json!(["expression"]));
    }

    #[test]
    fn test_tool_result_wire_format() {
        assert_eq!(
            serde_json::to_value(ToolResult::ok(json!(4))).unwrap(),
            json!({"result": 4})
        );
        assert_eq!(
            ToolResult::error("bad input").to_value(),
            json!({"error": "bad input"})
        );
    }
}
