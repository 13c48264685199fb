//! Integration tests for the OpenAI-compatible backend
//!
//! Runs the client and the full agent loop against a wiremock server
//! standing in for `/chat/completions`.

use std::sync::Arc;

use serde_json::{json, Value};
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, Request, ResponseTemplate,
};

use stride_engine::agent::{AgentConfig, Orchestrator};
use stride_engine::llm::openai::OpenAIBackend;
use stride_engine::llm::{BackendClient, BackendError, CapabilityDefinition, Turn};
use stride_engine::tools::{CapabilityRegistry, PythonTool};

fn backend(server: &MockServer) -> OpenAIBackend {
    OpenAIBackend::new(server.uri(), "gpt-test", "sk-test")
}

fn text_reply(content: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

fn tool_reply(name: &str, arguments: &str) -> Value {
    json!({
        "id": "chatcmpl-2",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_abc",
                    "type": "function",
                    "function": {"name": name, "arguments": arguments}
                }]
            },
            "finish_reason": "tool_calls"
        }]
    })
}

#[tokio::test]
async fn test_text_completion() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({"model": "gpt-test"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("FINAL 42")))
        .expect(1)
        .mount(&server)
        .await;

    let completion = backend(&server)
        .complete(&[Turn::system("sys"), Turn::user("Goal: x")], &[])
        .await
        .unwrap();

    assert_eq!(completion.content.as_deref(), Some("FINAL 42"));
    assert!(completion.tool_calls.is_empty());
}

#[tokio::test]
async fn test_tool_call_completion() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(tool_reply("run_python", r#"{"code":"print(1)"}"#)),
        )
        .mount(&server)
        .await;

    let catalog = vec![CapabilityDefinition {
        name: "run_python".to_string(),
        description: "Run code".to_string(),
        parameters: json!({"type": "object", "properties": {}}),
    }];
    let completion = backend(&server)
        .complete(&[Turn::user("Goal: x")], &catalog)
        .await
        .unwrap();

    assert_eq!(completion.content, None);
    assert_eq!(completion.tool_calls.len(), 1);
    assert_eq!(completion.tool_calls[0].name, "run_python");
    assert_eq!(completion.tool_calls[0].id.as_deref(), Some("call_abc"));
    assert_eq!(
        completion.tool_calls[0].arguments,
        Value::String(r#"{"code":"print(1)"}"#.to_string())
    );

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["tools"][0]["function"]["name"], "run_python");
    assert_eq!(body["tool_choice"], "auto");
}

#[tokio::test]
async fn test_empty_catalog_omits_tools() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("hi")))
        .mount(&server)
        .await;

    backend(&server).complete(&[Turn::user("x")], &[]).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("tools").is_none());
    assert!(body.get("tool_choice").is_none());
}

#[tokio::test]
async fn test_status_mapping() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = backend(&server);
    let turns = [Turn::user("x")];

    let err = client.complete(&turns, &[]).await.unwrap_err();
    assert!(matches!(err, BackendError::RateLimitExceeded));

    let err = client.complete(&turns, &[]).await.unwrap_err();
    assert!(matches!(err, BackendError::AuthenticationFailed(ref body) if body == "bad key"));

    let err = client.complete(&turns, &[]).await.unwrap_err();
    assert!(matches!(err, BackendError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_missing_choices_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = backend(&server)
        .complete(&[Turn::user("x")], &[])
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::MalformedPayload(_)));
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let client = OpenAIBackend::new("http://127.0.0.1:9", "gpt-test", "sk-test");
    let err = client.complete(&[Turn::user("x")], &[]).await.unwrap_err();
    assert!(matches!(err, BackendError::NetworkError(_)));
}

#[cfg(unix)]
#[tokio::test]
async fn test_full_loop_over_http() {
    let server = MockServer::start().await;

    // Served first: ask for code execution
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(tool_reply("run_python", r#"{"code":"echo 6"}"#)),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("FINAL 6")))
        .mount(&server)
        .await;

    // `sh` stands in for the interpreter so the test needs no Python install
    let registry = CapabilityRegistry::empty()
        .with(Arc::new(PythonTool::new(
            "sh",
            std::time::Duration::from_secs(5),
        )))
        .unwrap();
    let agent = Orchestrator::new(
        AgentConfig::new("You solve puzzles.").with_step_limit(5),
        Arc::new(backend(&server)),
        Arc::new(registry),
    );

    let report = agent.run_with_report("Compute 6").await.unwrap();
    assert_eq!(report.outcome.text(), "6");
    assert_eq!(report.steps, 2);
    assert_eq!(report.history[0].observation.trim(), "6");

    // The second request replays the call and its result
    let requests: Vec<Request> = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    let body: Value = serde_json::from_slice(&requests[1].body).unwrap();
    let messages = body["messages"].as_array().unwrap();
    let call = &messages[messages.len() - 2];
    let result = &messages[messages.len() - 1];
    assert_eq!(call["tool_calls"][0]["id"], "call_0");
    assert_eq!(result["role"], "tool");
    assert_eq!(result["tool_call_id"], "call_0");
}
