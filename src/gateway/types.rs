//! Request and response types shared by all provider backends.

use serde::{Deserialize, Serialize};

/// A single role-tagged message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A function/tool declaration with JSON-schema parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema for the arguments object.
    pub parameters: serde_json::Value,
}

/// Sampling options for a chat completion.
#[derive(Debug, Clone, Copy)]
pub struct ChatOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 4096,
        }
    }
}

/// Fully resolved request handed to a backend.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub tools: Option<Vec<ToolSpec>>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// What a backend actually returned.
///
/// The shape depends on provider capability: backends that honor
/// function calling return `ToolCall` with a JSON-serialized arguments
/// string; the rest return free text. The gateway does not hide the
/// difference — the response extractor owns normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawResponse {
    ToolCall { name: String, arguments: String },
    Text(String),
}

// ---------------------------------------------------------------------------
// OpenAI-compatible wire format, shared by all three HTTP backends.
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct WireCompletion {
    pub choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireChoice {
    pub message: WireMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireToolCall {
    pub function: WireFunction,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireFunction {
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireEmbeddingResponse {
    pub data: Vec<WireEmbedding>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireEmbedding {
    pub embedding: Vec<f32>,
}

impl WireCompletion {
    /// Pull the first choice into a [`RawResponse`], preferring a tool call
    /// over plain content when both are present.
    pub(crate) fn into_raw(self) -> Result<RawResponse, super::GatewayError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| super::GatewayError::BadResponse("no choices in completion".into()))?;

        if let Some(call) = choice
            .message
            .tool_calls
            .and_then(|calls| calls.into_iter().next())
        {
            return Ok(RawResponse::ToolCall {
                name: call.function.name,
                arguments: call.function.arguments,
            });
        }

        match choice.message.content {
            Some(content) if !content.trim().is_empty() => Ok(RawResponse::Text(content)),
            _ => Err(super::GatewayError::BadResponse(
                "completion had neither tool call nor content".into(),
            )),
        }
    }
}

/// Serialize a [`ChatRequest`] into an OpenAI-compatible JSON body.
pub(crate) fn wire_request_body(request: &ChatRequest, include_tools: bool) -> serde_json::Value {
    let mut body = serde_json::json!({
        "model": request.model,
        "messages": request.messages,
        "temperature": request.temperature,
        "max_tokens": request.max_tokens,
    });

    if include_tools {
        if let Some(tools) = &request.tools {
            let declarations: Vec<serde_json::Value> = tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
            body["tools"] = serde_json::Value::Array(declarations);
            body["tool_choice"] = serde_json::json!("auto");
        }
    }

    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_completion_prefers_tool_call() {
        let json = r#"{
            "choices": [{
                "message": {
                    "content": "ignored",
                    "tool_calls": [{
                        "id": "call-1",
                        "type": "function",
                        "function": {"name": "report", "arguments": "{\"modified\":\"x\"}"}
                    }]
                }
            }]
        }"#;
        let wire: WireCompletion = serde_json::from_str(json).unwrap();
        let raw = wire.into_raw().unwrap();
        assert_eq!(
            raw,
            RawResponse::ToolCall {
                name: "report".to_string(),
                arguments: "{\"modified\":\"x\"}".to_string()
            }
        );
    }

    #[test]
    fn wire_completion_falls_back_to_content() {
        let json = r#"{"choices":[{"message":{"content":"自由回答"}}]}"#;
        let wire: WireCompletion = serde_json::from_str(json).unwrap();
        assert_eq!(
            wire.into_raw().unwrap(),
            RawResponse::Text("自由回答".to_string())
        );
    }

    #[test]
    fn wire_completion_empty_is_bad_response() {
        let json = r#"{"choices":[{"message":{"content":"  "}}]}"#;
        let wire: WireCompletion = serde_json::from_str(json).unwrap();
        assert!(wire.into_raw().is_err());

        let json = r#"{"choices":[]}"#;
        let wire: WireCompletion = serde_json::from_str(json).unwrap();
        assert!(wire.into_raw().is_err());
    }

    #[test]
    fn request_body_includes_tools_when_asked() {
        let request = ChatRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![ChatMessage::user("テスト")],
            tools: Some(vec![ToolSpec {
                name: "report".to_string(),
                description: "report result".to_string(),
                parameters: serde_json::json!({"type": "object"}),
            }]),
            temperature: 0.2,
            max_tokens: 1024,
        };

        let body = wire_request_body(&request, true);
        assert_eq!(body["tools"][0]["function"]["name"], "report");
        assert_eq!(body["tool_choice"], "auto");

        let body = wire_request_body(&request, false);
        assert!(body.get("tools").is_none());
    }
}
