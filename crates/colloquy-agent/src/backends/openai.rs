use super::{map_transcript, send_checked, spawn_sse_reader, Frame, TokenBackend, TokenStream, TurnRequest};
use crate::config::ModelConfig;
use colloquy_core::{ColloquyResult, Provider};
use async_trait::async_trait;

/// OpenAI chat-completions backend.
pub struct OpenAiBackend {
    config: ModelConfig,
    http: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(config: ModelConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    /// System prompt first, then the transcript from the speaker's view.
    pub fn build_messages(request: &TurnRequest<'_>) -> Vec<serde_json::Value> {
        let mut api_messages: Vec<serde_json::Value> = Vec::new();

        if !request.system_prompt.is_empty() {
            api_messages.push(serde_json::json!({
                "role": "system",
                "content": request.system_prompt
            }));
        }

        for m in map_transcript(request.transcript, request.speaker) {
            api_messages.push(serde_json::json!({
                "role": m.role,
                "content": m.content
            }));
        }

        api_messages
    }
}

#[async_trait]
impl TokenBackend for OpenAiBackend {
    async fn stream_tokens(&self, request: TurnRequest<'_>) -> ColloquyResult<TokenStream> {
        let api_key = self.config.resolve_api_key()?;
        let url = format!(
            "{}/v1/chat/completions",
            self.config.base_url(Provider::OpenAi)
        );

        let body = serde_json::json!({
            "model": self.config.model_id,
            "max_tokens": self.config.max_tokens,
            "messages": Self::build_messages(&request),
            "stream": true,
        });

        let request = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&body);

        let resp = send_checked("OpenAI", request).await?;
        Ok(spawn_sse_reader(Provider::OpenAi, resp, "stop", decode_chunk))
    }
}

/// Decode one chat-completion chunk.
pub(crate) fn decode_chunk(data: &str) -> Vec<Frame> {
    if data == "[DONE]" {
        return vec![Frame::End];
    }

    let event: serde_json::Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(_) => return Vec::new(),
    };

    if let Some(message) = event["error"]["message"].as_str() {
        return vec![Frame::Failed(message.to_string())];
    }

    let mut frames = Vec::new();
    let choice = &event["choices"][0];

    if let Some(content) = choice["delta"]["content"].as_str() {
        if !content.is_empty() {
            frames.push(Frame::Text(content.to_string()));
        }
    }

    if let Some(fr) = choice["finish_reason"].as_str() {
        frames.push(Frame::StopReason(fr.to_string()));
    }

    frames
}
