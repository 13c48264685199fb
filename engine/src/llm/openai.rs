use super::{
    BackendClient, BackendError, CapabilityDefinition, RawCompletion, RawToolCall, Turn, TurnRole,
};
use crate::config::LlmConfig;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Client for OpenAI-compatible `/chat/completions` endpoints
pub struct OpenAIBackend {
    base_url: String,
    model: String,
    temperature: f64,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAIBackend {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            temperature: 1.0,
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Build a client from config, reading the API key from the environment
    pub fn from_config(config: &LlmConfig) -> super::Result<Self> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| {
            BackendError::AuthenticationFailed(format!("{} is not set", API_KEY_ENV))
        })?;
        Ok(Self::new(&config.base_url, &config.model, api_key).with_temperature(config.temperature))
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_payload(&self, turns: &[Turn], catalog: &[CapabilityDefinition]) -> Value {
        let messages: Vec<Value> = turns.iter().map(turn_to_message).collect();

        let mut payload = json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
        });

        if !catalog.is_empty() {
            let tools: Vec<Value> = catalog
                .iter()
                .map(|def| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": def.name,
                            "description": def.description,
                            "parameters": def.parameters,
                        }
                    })
                })
                .collect();
            payload["tools"] = Value::Array(tools);
            payload["tool_choice"] = json!("auto");
        }

        payload
    }
}

/// Map a transcript turn onto the chat-completions message shape
fn turn_to_message(turn: &Turn) -> Value {
    match turn.role {
        TurnRole::CapabilityResult => json!({
            "role": "tool",
            "tool_call_id": turn.correlation_id,
            "content": turn.content,
        }),
        TurnRole::Assistant => match &turn.capability_call {
            Some(call) => json!({
                "role": "assistant",
                "content": Value::Null,
                "tool_calls": [{
                    "id": call.id,
                    "type": "function",
                    "function": {
                        "name": call.name,
                        "arguments": call.arguments_json(),
                    }
                }]
            }),
            None => json!({"role": "assistant", "content": turn.content}),
        },
        TurnRole::System | TurnRole::User => json!({
            "role": turn.role.to_string(),
            "content": turn.content,
        }),
    }
}

/// Extract the first choice's message from a chat-completions response body
fn parse_completion(data: &Value) -> super::Result<RawCompletion> {
    let choice = data
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .ok_or_else(|| BackendError::MalformedPayload("No choices in response".to_string()))?;

    let message = choice
        .get("message")
        .ok_or_else(|| BackendError::MalformedPayload("No message in choice".to_string()))?;

    let content = message
        .get("content")
        .and_then(|c| c.as_str())
        .map(String::from);

    let mut tool_calls = Vec::new();
    if let Some(calls) = message.get("tool_calls").and_then(|c| c.as_array()) {
        for call in calls {
            let function = call.get("function").ok_or_else(|| {
                BackendError::MalformedPayload("Tool call without function".to_string())
            })?;
            let name = function
                .get("name")
                .and_then(|n| n.as_str())
                .ok_or_else(|| {
                    BackendError::MalformedPayload("Tool call without name".to_string())
                })?;
            tool_calls.push(RawToolCall {
                id: call.get("id").and_then(|i| i.as_str()).map(String::from),
                name: name.to_string(),
                arguments: function.get("arguments").cloned().unwrap_or(Value::Null),
            });
        }
    }

    Ok(RawCompletion {
        content,
        tool_calls,
    })
}

#[async_trait]
impl BackendClient for OpenAIBackend {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(
        &self,
        turns: &[Turn],
        catalog: &[CapabilityDefinition],
    ) -> super::Result<RawCompletion> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let payload = self.build_payload(turns, catalog);

        debug!(
            "Requesting completion from {} ({} turns, {} capabilities)",
            self.model,
            turns.len(),
            catalog.len()
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| BackendError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(BackendError::AuthenticationFailed(text));
            } else if status.as_u16() == 429 {
                return Err(BackendError::RateLimitExceeded);
            } else {
                return Err(BackendError::InvalidRequest(format!("{}: {}", status, text)));
            }
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| BackendError::MalformedPayload(e.to_string()))?;

        parse_completion(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdk::{Arguments, CapabilityCall};

    #[test]
    fn test_turn_to_message_shapes() {
        let mut args = Arguments::new();
        args.insert("day".to_string(), json!(5));
        let call = Turn::capability_call(CapabilityCall::new("call_0", "get_puzzle_input", args));
        let msg = turn_to_message(&call);
        assert_eq!(msg["role"], "assistant");
        assert_eq!(msg["tool_calls"][0]["id"], "call_0");
        assert_eq!(msg["tool_calls"][0]["function"]["arguments"], r#"{"day":5}"#);

        let result = turn_to_message(&Turn::capability_result("get_puzzle_input", "call_0", "abc"));
        assert_eq!(msg["tool_calls"][0]["type"], "function");
        assert_eq!(result["role"], "tool");
        assert_eq!(result["tool_call_id"], "call_0");
        assert_eq!(result["content"], "abc");

        let user = turn_to_message(&Turn::user("Goal: x"));
        assert_eq!(user["role"], "user");
    }

    #[test]
    fn test_payload_omits_tools_for_empty_catalog() {
        let backend = OpenAIBackend::new("http://localhost", "gpt-5-mini", "key");
        let payload = backend.build_payload(&[Turn::user("hi")], &[]);
        assert!(payload.get("tools").is_none());
        assert!(payload.get("tool_choice").is_none());

        let catalog = vec![CapabilityDefinition {
            name: "run_python".to_string(),
            description: "Run code".to_string(),
            parameters: json!({"type": "object"}),
        }];
        let payload = backend.build_payload(&[Turn::user("hi")], &catalog);
        assert_eq!(payload["tools"][0]["function"]["name"], "run_python");
        assert_eq!(payload["tool_choice"], "auto");
    }

    #[test]
    fn test_parse_completion_with_tool_calls() {
        let data = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {
                            "id": "x1",
                            "type": "function",
                            "function": {"name": "a", "arguments": "{\"day\": 1}"}
                        },
                        {
                            "id": "x2",
                            "type": "function",
                            "function": {"name": "b", "arguments": "{}"}
                        }
                    ]
                }
            }]
        });
        let raw = parse_completion(&data).unwrap();
        assert_eq!(raw.content, None);
        assert_eq!(raw.tool_calls.len(), 2);
        assert_eq!(raw.tool_calls[0].name, "a");
        assert_eq!(raw.tool_calls[0].arguments, json!("{\"day\": 1}"));
    }

    #[test]
    fn test_parse_completion_without_choices() {
        let err = parse_completion(&json!({"choices": []})).unwrap_err();
        assert!(matches!(err, BackendError::MalformedPayload(_)));
    }
}
