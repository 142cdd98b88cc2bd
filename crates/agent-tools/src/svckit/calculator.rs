//! Calculator Tool
//!
//! Evaluates arithmetic expressions so the model never does math in its head.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use agent_core::{Arguments, ParameterSchema, Tool, ToolResult, ToolSchema};

use crate::expression;

/// Largest magnitude at which every integer is exactly representable as f64
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Tool for evaluating arithmetic
#[derive(Default)]
pub struct CalculatorTool;

impl CalculatorTool {
    pub fn new() -> Self {
        Self
    }
}

/// Integral results are reported as JSON integers: `4`, not `4.0`
#[allow(clippy::cast_possible_truncation)]
fn to_number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER {
        json!(value as i64)
    } else {
        json!(value)
    }
}

/// A finite numeric operand, given either as a JSON number or a numeric
/// string, rendered in plain decimal form the expression grammar accepts
fn operand(value: &Value) -> Option<String> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then(|| number.to_string())
}

#[async_trait]
impl Tool for CalculatorTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "calculator",
            "Evaluate an arithmetic expression. Supports + - * / and parentheses.",
        )
        .param(ParameterSchema::required(
            "expression",
            "string",
            "The expression to evaluate (e.g., '(2 + 3) * 4')",
        ))
    }

    async fn execute(&self, arguments: &Arguments) -> ToolResult {
        let Some(expr) = arguments.get("expression").and_then(Value::as_str) else {
            return ToolResult::error("Missing expression");
        };

        match expression::evaluate(expr) {
            Ok(value) => {
                debug!(expr, value, "Evaluated expression");
                ToolResult::ok(to_number(value))
            }
            Err(e) => ToolResult::error(e.to_string()),
        }
    }

    /// Models that think "multiply" often send `{num1, num2}`
    fn adapt_arguments(&self, arguments: &Arguments) -> Option<Arguments> {
        let a = operand(arguments.get("num1")?)?;
        let b = operand(arguments.get("num2")?)?;

        let mut adapted = Arguments::new();
        adapted.insert("expression".into(), json!(format!("{a} * {b}")));
        Some(adapted)
    }
}
