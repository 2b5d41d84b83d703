//! Regression tests for colloquy-agent: provider backends against mock HTTP APIs.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use colloquy_agent::{LlmClient, ModelConfig, ProvidersConfig, StreamEvent, TurnRequest};
use colloquy_core::{ColloquyError, DialogMessage, Provider};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn openai_body(tokens: &[&str]) -> String {
    let mut body = String::new();
    for t in tokens {
        let chunk = serde_json::json!({
            "choices": [{"delta": {"content": t}, "finish_reason": null}]
        });
        body.push_str(&format!("data: {chunk}\n\n"));
    }
    body.push_str("data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n");
    body.push_str("data: [DONE]\n\n");
    body
}

fn claude_body(tokens: &[&str]) -> String {
    let mut body = String::from(
        "event: message_start\ndata: {\"type\":\"message_start\",\"message\":{}}\n\n",
    );
    for t in tokens {
        let chunk = serde_json::json!({
            "type": "content_block_delta",
            "index": 0,
            "delta": {"type": "text_delta", "text": t}
        });
        body.push_str(&format!("event: content_block_delta\ndata: {chunk}\n\n"));
    }
    body.push_str(
        "event: message_delta\ndata: {\"type\":\"message_delta\",\"delta\":{\"stop_reason\":\"end_turn\"}}\n\n",
    );
    body.push_str("event: message_stop\ndata: {\"type\":\"message_stop\"}\n\n");
    body
}

fn client_for(server: &MockServer) -> LlmClient {
    let mut config = ProvidersConfig::default();
    config.openai.api_key = Some("sk-test".to_string());
    config.openai.api_base_url = Some(server.uri());
    config.anthropic.api_key = Some("ant-test".to_string());
    config.anthropic.api_base_url = Some(server.uri());
    LlmClient::new(config)
}

async fn collect_text(mut rx: tokio::sync::mpsc::Receiver<StreamEvent>) -> Vec<String> {
    let mut tokens = Vec::new();
    while let Some(event) = rx.recv().await {
        if let StreamEvent::TextDelta { text } = event {
            tokens.push(text);
        }
    }
    tokens
}

// --- OpenAI ---

#[tokio::test]
async fn test_openai_streams_tokens_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(openai_body(&["Hello", ", ", "world"]), "text/event-stream"),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let transcript = vec![DialogMessage::model(Provider::Anthropic, "Skeptic", "Prove it.")];
    let (rx, handle) = client
        .stream_tokens(TurnRequest {
            system_prompt: "You are the Optimist.",
            transcript: &transcript,
            speaker: Provider::OpenAi,
        })
        .await
        .unwrap();

    assert_eq!(collect_text(rx).await, vec!["Hello", ", ", "world"]);
    let completion = handle.await.unwrap().unwrap();
    assert_eq!(completion.text, "Hello, world");
    assert_eq!(completion.stop_reason, "stop");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = requests[0].body_json().unwrap();
    assert_eq!(body["stream"], true);
    assert_eq!(body["model"], "gpt-4o");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], "You are the Optimist.");
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "[Skeptic]: Prove it.");
}

#[tokio::test]
async fn test_openai_error_status_is_provider_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .stream_tokens(TurnRequest {
            system_prompt: "p",
            transcript: &[],
            speaker: Provider::OpenAi,
        })
        .await
        .unwrap_err();

    match err {
        ColloquyError::ProviderUnavailable(msg) => {
            assert!(msg.contains("500"));
            assert!(msg.contains("upstream exploded"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

// --- Anthropic ---

#[tokio::test]
async fn test_claude_streams_tokens_with_placeholder() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "ant-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(claude_body(&["I ", "doubt ", "it."]), "text/event-stream"),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let (rx, handle) = client
        .stream_tokens(TurnRequest {
            system_prompt: "",
            transcript: &[],
            speaker: Provider::Anthropic,
        })
        .await
        .unwrap();

    assert_eq!(collect_text(rx).await, vec!["I ", "doubt ", "it."]);
    let completion = handle.await.unwrap().unwrap();
    assert_eq!(completion.text, "I doubt it.");
    assert_eq!(completion.stop_reason, "end_turn");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = requests[0].body_json().unwrap();
    assert_eq!(body["system"], "You are a helpful conversation partner.");
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(body["messages"][0]["content"], "(Start of dialog)");
}

#[tokio::test]
async fn test_claude_error_event_fails_the_turn() {
    let server = MockServer::start().await;
    let body = format!(
        "{}data: {{\"type\":\"error\",\"error\":{{\"type\":\"overloaded_error\",\"message\":\"Overloaded\"}}}}\n\n",
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Part\"}}\n\n"
    );
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let (mut rx, handle) = client
        .stream_tokens(TurnRequest {
            system_prompt: "p",
            transcript: &[],
            speaker: Provider::Anthropic,
        })
        .await
        .unwrap();

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    assert_eq!(
        events[0],
        StreamEvent::TextDelta {
            text: "Part".to_string()
        }
    );
    assert!(matches!(events.last(), Some(StreamEvent::Error { .. })));

    let err = handle.await.unwrap().unwrap_err();
    assert!(matches!(err, ColloquyError::ProviderUnavailable(_)));
}

// --- Credentials ---

#[tokio::test]
async fn test_missing_credential_fails_before_request() {
    let server = MockServer::start().await;

    let mut openai = ModelConfig::openai();
    openai.api_key_env = "COLLOQUY_REGRESSION_UNSET_KEY".to_string();
    openai.api_base_url = Some(server.uri());
    let client = LlmClient::new(ProvidersConfig {
        openai,
        anthropic: ModelConfig::anthropic(),
    });

    let err = client
        .stream_tokens(TurnRequest {
            system_prompt: "p",
            transcript: &[],
            speaker: Provider::OpenAi,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ColloquyError::ProviderUnavailable(_)));
    assert!(err.to_string().contains("COLLOQUY_REGRESSION_UNSET_KEY"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

// --- Cancellation ---

#[tokio::test]
async fn test_dropping_receiver_stops_reader() {
    let server = MockServer::start().await;
    let tokens: Vec<String> = (0..600).map(|i| format!("t{i} ")).collect();
    let token_refs: Vec<&str> = tokens.iter().map(String::as_str).collect();
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(openai_body(&token_refs), "text/event-stream"),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let (rx, handle) = client
        .stream_tokens(TurnRequest {
            system_prompt: "p",
            transcript: &[],
            speaker: Provider::OpenAi,
        })
        .await
        .unwrap();
    drop(rx);

    let completion = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
        .await
        .expect("reader task should end once the receiver is gone")
        .unwrap()
        .unwrap();
    assert!(completion.text.len() < tokens.concat().len());
}
