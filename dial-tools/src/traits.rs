use crate::error::{Result, ToolError};
use async_trait::async_trait;

/// Description of a tool as advertised to the remote model.
///
/// `parameters_schema` is a JSON Schema object and is conveyed to the model
/// verbatim.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters_schema: serde_json::Value,
}

/// A capability the remote model may invoke by name.
///
/// `execute` must not fail: a tool catches its own faults and renders them
/// into the returned string, so the orchestrator can feed any result back to
/// the model without distinguishing success from tool-reported failure.
#[async_trait]
pub trait Tool: Send + Sync {
    fn spec(&self) -> ToolSpec;
    async fn execute(&self, arguments: serde_json::Value) -> String;
}

pub fn require_string(args: &serde_json::Value, key: &str) -> Result<String> {
    let Some(v) = args.get(key) else {
        return Err(ToolError::InvalidArguments(format!("missing key: {key}")));
    };
    match v {
        serde_json::Value::String(s) => Ok(s.clone()),
        other => Err(ToolError::InvalidArguments(format!(
            "key {key} must be string, got {other:?}"
        ))),
    }
}

pub fn optional_string(args: &serde_json::Value, key: &str) -> Result<Option<String>> {
    let Some(v) = args.get(key) else {
        return Ok(None);
    };
    match v {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) => Ok(Some(s.clone())),
        other => Err(ToolError::InvalidArguments(format!(
            "key {key} must be string, got {other:?}"
        ))),
    }
}

pub fn require_f64(args: &serde_json::Value, key: &str) -> Result<f64> {
    let Some(v) = args.get(key) else {
        return Err(ToolError::InvalidArguments(format!("missing key: {key}")));
    };
    match v.as_f64() {
        Some(n) => Ok(n),
        None => Err(ToolError::InvalidArguments(format!(
            "key {key} must be a number, got {v:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn require_string_extracts_and_rejects() {
        let args = json!({ "city": "Berlin", "count": 3 });
        assert_eq!(require_string(&args, "city").unwrap(), "Berlin");
        assert!(require_string(&args, "count").is_err());
        assert!(require_string(&args, "missing").is_err());
    }

    #[test]
    fn optional_string_treats_null_as_absent() {
        let args = json!({ "unit": null, "city": "Oslo" });
        assert_eq!(optional_string(&args, "unit").unwrap(), None);
        assert_eq!(
            optional_string(&args, "city").unwrap(),
            Some("Oslo".to_string())
        );
        assert_eq!(optional_string(&args, "missing").unwrap(), None);
    }

    #[test]
    fn require_f64_accepts_integers_and_floats() {
        let args = json!({ "a": 1, "b": 2.5, "c": "3" });
        assert_eq!(require_f64(&args, "a").unwrap(), 1.0);
        assert_eq!(require_f64(&args, "b").unwrap(), 2.5);
        assert!(require_f64(&args, "c").is_err());
    }
}
