use crate::error::{Result, ToolError};
use crate::traits::{require_f64, require_string, Tool, ToolSpec};
use async_trait::async_trait;

/// Basic arithmetic over two operands.
pub struct CalculatorTool;

impl CalculatorTool {
    pub fn new() -> Self {
        Self
    }

    fn evaluate(&self, arguments: &serde_json::Value) -> Result<f64> {
        let operation = require_string(arguments, "operation")?;
        let a = require_f64(arguments, "a")?;
        let b = require_f64(arguments, "b")?;

        match operation.as_str() {
            "add" => Ok(a + b),
            "subtract" => Ok(a - b),
            "multiply" => Ok(a * b),
            "divide" => {
                if b == 0.0 {
                    return Err(ToolError::ExecutionFailed("division by zero".to_string()));
                }
                Ok(a / b)
            }
            other => Err(ToolError::InvalidArguments(format!(
                "unknown operation: {other}"
            ))),
        }
    }
}

impl Default for CalculatorTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for CalculatorTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "calculator".to_string(),
            description: "Evaluate an arithmetic operation over two numbers.".to_string(),
            parameters_schema: serde_json::json!({
                "type": "object",
                "additionalProperties": false,
                "properties": {
                    "operation": {
                        "type": "string",
                        "enum": ["add", "subtract", "multiply", "divide"]
                    },
                    "a": { "type": "number" },
                    "b": { "type": "number" }
                },
                "required": ["operation", "a", "b"]
            }),
        }
    }

    #[tracing::instrument(level = "info", skip_all)]
    async fn execute(&self, arguments: serde_json::Value) -> String {
        match self.evaluate(&arguments) {
            Ok(value) => {
                // Integral results print without a trailing ".0" so the model
                // sees "3" rather than "3.0".
                if value.fract() == 0.0 && value.is_finite() {
                    format!("{}", value as i64)
                } else {
                    format!("{value}")
                }
            }
            Err(e) => format!("Error: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn evaluates_all_operations() {
        let tool = CalculatorTool::new();
        assert_eq!(
            tool.execute(json!({ "operation": "add", "a": 1, "b": 2 }))
                .await,
            "3"
        );
        assert_eq!(
            tool.execute(json!({ "operation": "subtract", "a": 5, "b": 1.5 }))
                .await,
            "3.5"
        );
        assert_eq!(
            tool.execute(json!({ "operation": "multiply", "a": 4, "b": 2 }))
                .await,
            "8"
        );
        assert_eq!(
            tool.execute(json!({ "operation": "divide", "a": 9, "b": 2 }))
                .await,
            "4.5"
        );
    }

    #[tokio::test]
    async fn faults_are_rendered_into_the_result() {
        let tool = CalculatorTool::new();

        let out = tool
            .execute(json!({ "operation": "divide", "a": 1, "b": 0 }))
            .await;
        assert!(out.starts_with("Error:"), "got: {out}");
        assert!(out.contains("division by zero"));

        let out = tool.execute(json!({ "operation": "modulo", "a": 1, "b": 2 })).await;
        assert!(out.contains("unknown operation"));

        let out = tool.execute(json!({ "a": 1, "b": 2 })).await;
        assert!(out.contains("missing key: operation"));
    }
}
