use crate::error::{DialError, Result};
use crate::types::{ChatMessage, Role, ToolCall, Usage};
use dial_tools::Tool;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

const FINISH_REASON_TOOL_CALLS: &str = "tool_calls";

/// Client for a DIAL-style chat-completions deployment with tool calling.
///
/// Holds the composed request URL, the credential, and a registry of tools
/// frozen at construction. `get_completion` drives the request/tool loop until
/// the model stops asking for tools.
pub struct DialClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
    tools: HashMap<String, Arc<dyn Tool>>,
    tool_defs: Vec<WireTool>,
    max_rounds: Option<usize>,
}

impl DialClient {
    /// Build a client for `{endpoint}/openai/deployments/{deployment}/chat/completions`.
    ///
    /// Fails when `api_key` trims to empty. Duplicate tool names are allowed;
    /// the last registration wins. The supplied tools are advertised to the
    /// model on every request, in supply order.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn new(
        endpoint: &str,
        deployment: &str,
        api_key: &str,
        tools: Vec<Arc<dyn Tool>>,
    ) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(DialError::Config(
                "api key cannot be null or empty".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(%e, "reqwest client build failed; falling back to default client");
                reqwest::Client::new()
            });

        let url = format!("{endpoint}/openai/deployments/{deployment}/chat/completions");

        let tool_defs: Vec<WireTool> = tools.iter().map(|t| to_wire_tool(t.as_ref())).collect();
        let mut registry: HashMap<String, Arc<dyn Tool>> = HashMap::new();
        for tool in tools {
            registry.insert(tool.spec().name, tool);
        }

        tracing::debug!(url = %url, tools_registered = registry.len(), "dial client configured");

        Ok(Self {
            http,
            url,
            api_key: api_key.to_string(),
            tools: registry,
            tool_defs,
            max_rounds: None,
        })
    }

    /// Cap the number of request rounds per `get_completion` call. Unset by
    /// default, in which case the model's own behavior is the only
    /// termination guarantee.
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = Some(max_rounds);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Run the completion loop until the model produces a final answer.
    ///
    /// Each round posts the conversation, and when the model finishes with
    /// `tool_calls`, appends the assistant turn plus one tool-result turn per
    /// requested call before going around again. The conversation is mutated
    /// in place: after a multi-round exchange it contains every intermediate
    /// assistant and tool turn. The final assistant message is returned and
    /// not appended.
    #[tracing::instrument(level = "info", skip_all)]
    pub async fn get_completion(&self, messages: &mut Vec<ChatMessage>) -> Result<ChatMessage> {
        let mut rounds = 0usize;

        loop {
            rounds += 1;
            if let Some(max) = self.max_rounds {
                if rounds > max {
                    tracing::error!(max_rounds = max, "tool round limit reached");
                    return Err(DialError::RoundLimit(max));
                }
            }

            let round_started = Instant::now();
            let outcome = self.request_completion(messages).await?;
            if let Some(usage) = outcome.usage.as_ref() {
                tracing::info!(
                    round = rounds,
                    latency_ms = round_started.elapsed().as_millis() as u64,
                    finish_reason = %outcome.finish_reason,
                    tool_calls = outcome.message.tool_calls.len(),
                    prompt_tokens = usage.prompt_tokens,
                    completion_tokens = usage.completion_tokens,
                    "completion round finished"
                );
            } else {
                tracing::info!(
                    round = rounds,
                    latency_ms = round_started.elapsed().as_millis() as u64,
                    finish_reason = %outcome.finish_reason,
                    tool_calls = outcome.message.tool_calls.len(),
                    "completion round finished"
                );
            }

            if outcome.finish_reason != FINISH_REASON_TOOL_CALLS {
                return Ok(outcome.message);
            }

            let tool_calls = outcome.message.tool_calls.clone();
            messages.push(outcome.message);

            let tool_messages = self.process_tool_calls(&tool_calls).await?;
            messages.extend(tool_messages);
        }
    }

    /// One request/response round. Nothing is appended to the conversation on
    /// any failure path here.
    async fn request_completion(&self, messages: &[ChatMessage]) -> Result<RoundOutcome> {
        let request = DialChatRequest {
            messages: messages.iter().map(to_wire_message).collect(),
            tools: &self.tool_defs,
        };
        tracing::debug!(
            messages = request.messages.len(),
            tools = self.tool_defs.len(),
            "issuing completion request"
        );

        let response = self
            .http
            .post(&self.url)
            .header("api-key", &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status != reqwest::StatusCode::OK {
            return Err(DialError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: DialChatResponse = serde_json::from_str(&body)?;

        // Only the first choice is consulted; the API may return several but
        // multi-choice handling is deliberately not exposed.
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DialError::ResponseFormat("no choice present in response".to_string()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .into_iter()
            .map(|tc| ToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments: tc.function.arguments,
            })
            .collect();

        Ok(RoundOutcome {
            message: ChatMessage::assistant(choice.message.content.unwrap_or_default(), tool_calls),
            finish_reason: choice
                .finish_reason
                .unwrap_or_else(|| "unknown".to_string()),
            usage: parsed.usage.map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            }),
        })
    }

    /// Execute one assistant turn's tool calls, strictly in order, and build
    /// the tool-result turns. A malformed arguments string fails the whole
    /// batch; the conversation keeps the already-appended assistant turn.
    async fn process_tool_calls(&self, tool_calls: &[ToolCall]) -> Result<Vec<ChatMessage>> {
        let mut tool_messages = Vec::with_capacity(tool_calls.len());

        for call in tool_calls {
            let arguments: serde_json::Value =
                serde_json::from_str(&call.arguments).map_err(|e| DialError::ToolArguments {
                    name: call.name.clone(),
                    reason: e.to_string(),
                })?;

            let execute_started = Instant::now();
            let output = self.call_tool(&call.name, arguments).await;
            tracing::info!(
                tool_call_id = %call.id,
                tool_name = %call.name,
                latency_ms = execute_started.elapsed().as_millis() as u64,
                output_len = output.len(),
                "tool call executed"
            );

            tool_messages.push(ChatMessage::tool_result(&call.name, &call.id, output));
        }

        Ok(tool_messages)
    }

    /// Dispatch to the registry. An unknown name is not a fault: the sentinel
    /// string goes back to the model so it can correct itself.
    async fn call_tool(&self, name: &str, arguments: serde_json::Value) -> String {
        match self.tools.get(name) {
            Some(tool) => tool.execute(arguments).await,
            None => {
                tracing::warn!(tool_name = %name, "tool call referenced unknown tool");
                format!("Unknown function: {name}")
            }
        }
    }
}

struct RoundOutcome {
    message: ChatMessage,
    finish_reason: String,
    usage: Option<Usage>,
}

#[derive(Debug, Serialize)]
struct DialChatRequest<'a> {
    messages: Vec<WireMessage>,
    tools: &'a [WireTool],
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct WireToolCall {
    id: String,
    r#type: String,
    function: WireToolCallFunction,
}

#[derive(Debug, Serialize)]
struct WireToolCallFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Clone, Serialize)]
struct WireTool {
    r#type: String,
    function: WireToolFunction,
}

#[derive(Debug, Clone, Serialize)]
struct WireToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

fn to_wire_tool(tool: &dyn Tool) -> WireTool {
    let spec = tool.spec();
    WireTool {
        r#type: "function".to_string(),
        function: WireToolFunction {
            name: spec.name,
            description: spec.description,
            parameters: spec.parameters_schema,
        },
    }
}

fn to_wire_message(m: &ChatMessage) -> WireMessage {
    let role = match m.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    };
    WireMessage {
        role: role.to_string(),
        content: Some(m.content.clone()).filter(|s| !s.is_empty()),
        tool_calls: m
            .tool_calls
            .iter()
            .map(|tc| WireToolCall {
                id: tc.id.clone(),
                r#type: "function".to_string(),
                function: WireToolCallFunction {
                    name: tc.name.clone(),
                    arguments: tc.arguments.clone(),
                },
            })
            .collect(),
        name: m.name.clone(),
        tool_call_id: m.tool_call_id.clone(),
    }
}

#[derive(Debug, Deserialize)]
struct DialChatResponse {
    #[serde(default)]
    choices: Vec<DialChoice>,
    #[serde(default)]
    usage: Option<DialUsage>,
}

#[derive(Debug, Deserialize)]
struct DialChoice {
    message: DialChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DialChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<DialChoiceToolCall>,
}

#[derive(Debug, Deserialize)]
struct DialChoiceToolCall {
    id: String,
    #[serde(default)]
    function: DialChoiceToolCallFunction,
}

#[derive(Debug, Deserialize, Default)]
struct DialChoiceToolCallFunction {
    #[serde(default)]
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct DialUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}
