use super::{map_transcript, send_checked, spawn_sse_reader, Frame, TokenBackend, TokenStream, TurnRequest, WireMessage};
use crate::config::ModelConfig;
use colloquy_core::{ColloquyResult, Provider};
use async_trait::async_trait;

/// Placeholder opening message when the transcript does not start with `user`.
pub const DIALOG_START_PLACEHOLDER: &str = "(Start of dialog)";

/// System prompt used when the participant's prompt is empty.
pub const FALLBACK_SYSTEM_PROMPT: &str = "You are a helpful conversation partner.";

/// Claude (Anthropic) messages API backend.
pub struct ClaudeBackend {
    config: ModelConfig,
    http: reqwest::Client,
}

impl ClaudeBackend {
    pub fn new(config: ModelConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    /// Map the transcript, opening with a `user` turn as the API requires.
    pub fn build_messages(request: &TurnRequest<'_>) -> Vec<WireMessage> {
        let mut api_messages = map_transcript(request.transcript, request.speaker);
        if api_messages.first().map_or(true, |m| m.role == "assistant") {
            api_messages.insert(
                0,
                WireMessage {
                    role: "user",
                    content: DIALOG_START_PLACEHOLDER.to_string(),
                },
            );
        }
        api_messages
    }
}

#[async_trait]
impl TokenBackend for ClaudeBackend {
    async fn stream_tokens(&self, request: TurnRequest<'_>) -> ColloquyResult<TokenStream> {
        let api_key = self.config.resolve_api_key()?;
        let url = format!("{}/v1/messages", self.config.base_url(Provider::Anthropic));

        let system = if request.system_prompt.is_empty() {
            FALLBACK_SYSTEM_PROMPT
        } else {
            request.system_prompt
        };

        let body = serde_json::json!({
            "model": self.config.model_id,
            "max_tokens": self.config.max_tokens,
            "system": system,
            "messages": Self::build_messages(&request),
            "stream": true,
        });

        let request = self
            .http
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body);

        let resp = send_checked("Claude", request).await?;
        Ok(spawn_sse_reader(
            Provider::Anthropic,
            resp,
            "end_turn",
            decode_event,
        ))
    }
}

/// Decode one messages-API stream event.
pub(crate) fn decode_event(data: &str) -> Vec<Frame> {
    let event: serde_json::Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(_) => return Vec::new(),
    };

    match event["type"].as_str().unwrap_or("") {
        "content_block_delta" => {
            let delta = &event["delta"];
            match (delta["type"].as_str(), delta["text"].as_str()) {
                (Some("text_delta"), Some(text)) if !text.is_empty() => {
                    vec![Frame::Text(text.to_string())]
                }
                _ => Vec::new(),
            }
        }
        "message_delta" => event["delta"]["stop_reason"]
            .as_str()
            .map(|sr| vec![Frame::StopReason(sr.to_string())])
            .unwrap_or_default(),
        "message_stop" => vec![Frame::End],
        "error" => {
            let message = event["error"]["message"]
                .as_str()
                .unwrap_or("unknown stream error");
            vec![Frame::Failed(message.to_string())]
        }
        _ => Vec::new(),
    }
}
