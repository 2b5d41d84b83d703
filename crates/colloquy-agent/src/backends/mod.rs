pub mod claude;
pub mod openai;

use crate::stream::{Completion, SseLineBuffer, StreamEvent};
use colloquy_core::{ColloquyError, ColloquyResult, DialogMessage, Provider};
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Receiver of streamed text plus the reader task resolving the turn outcome.
pub type TokenStream = (
    mpsc::Receiver<StreamEvent>,
    JoinHandle<ColloquyResult<Completion>>,
);

/// Everything a backend needs to produce one turn.
#[derive(Debug, Clone, Copy)]
pub struct TurnRequest<'a> {
    /// Cached system prompt of the speaking participant.
    pub system_prompt: &'a str,
    /// The full transcript so far.
    pub transcript: &'a [DialogMessage],
    /// Provider of the participant whose turn it is.
    pub speaker: Provider,
}

/// Trait for provider backends.
///
/// Each backend maps the provider-agnostic transcript into its own role
/// convention and streams the reply. The set of backends is closed: the
/// [`LlmClient`](crate::llm::LlmClient) picks one by [`Provider`] tag.
#[async_trait]
pub trait TokenBackend: Send + Sync {
    /// Start a streaming completion for the given turn.
    ///
    /// Fails with `ProviderUnavailable` before any token is produced when the
    /// credential is missing or the request is rejected. Failures after the
    /// stream started surface through the returned join handle.
    async fn stream_tokens(&self, request: TurnRequest<'_>) -> ColloquyResult<TokenStream>;
}

/// A message in the `{role, content}` shape both APIs accept.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WireMessage {
    pub role: &'static str,
    pub content: String,
}

/// Map the transcript from the speaker's point of view.
///
/// Messages attributed to the speaking provider read as `assistant`, all
/// others as `user`. Contents carry the author label so attribution survives
/// the two-role mapping.
pub fn map_transcript(transcript: &[DialogMessage], speaker: Provider) -> Vec<WireMessage> {
    transcript
        .iter()
        .map(|m| WireMessage {
            role: if m.provider == speaker {
                "assistant"
            } else {
                "user"
            },
            content: m.attributed_content(),
        })
        .collect()
}

/// One decoded unit of a provider's SSE payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Frame {
    Text(String),
    StopReason(String),
    End,
    Failed(String),
}

/// Read a streaming HTTP body on a background task.
///
/// `decode` turns one `data:` payload into frames. Reading stops when the
/// provider signals the end, the body is exhausted, or the receiver is
/// dropped; in the last case the connection is released without draining.
pub(crate) fn spawn_sse_reader<F>(
    provider: Provider,
    resp: reqwest::Response,
    default_stop: &'static str,
    decode: F,
) -> TokenStream
where
    F: Fn(&str) -> Vec<Frame> + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<StreamEvent>(256);
    let byte_stream = resp.bytes_stream();

    let handle = tokio::spawn(async move {
        let mut stream = byte_stream;
        let mut lines = SseLineBuffer::new();
        let mut completion = Completion {
            text: String::new(),
            stop_reason: default_stop.to_string(),
        };

        'read: while let Some(chunk_result) = stream.next().await {
            let chunk = match chunk_result {
                Ok(bytes) => bytes,
                Err(e) => {
                    let message = format!("{provider} stream read error: {e}");
                    let _ = tx
                        .send(StreamEvent::Error {
                            message: message.clone(),
                        })
                        .await;
                    return Err(ColloquyError::ProviderUnavailable(message));
                }
            };

            for payload in lines.push(&chunk) {
                for frame in decode(&payload) {
                    match frame {
                        Frame::Text(text) => {
                            completion.text.push_str(&text);
                            if tx.send(StreamEvent::TextDelta { text }).await.is_err() {
                                debug!(%provider, "Token consumer dropped, closing provider stream");
                                return Ok(completion);
                            }
                        }
                        Frame::StopReason(reason) => completion.stop_reason = reason,
                        Frame::End => {
                            let _ = tx.send(StreamEvent::Done).await;
                            break 'read;
                        }
                        Frame::Failed(message) => {
                            let message = format!("{provider} stream error: {message}");
                            let _ = tx
                                .send(StreamEvent::Error {
                                    message: message.clone(),
                                })
                                .await;
                            return Err(ColloquyError::ProviderUnavailable(message));
                        }
                    }
                }
            }
        }

        Ok(completion)
    });

    (rx, handle)
}

/// Send a prepared request and reject non-success responses.
pub(crate) async fn send_checked(
    api_name: &str,
    request: reqwest::RequestBuilder,
) -> ColloquyResult<reqwest::Response> {
    let resp = request
        .send()
        .await
        .map_err(|e| ColloquyError::ProviderUnavailable(format!("{api_name} request failed: {e}")))?;

    let status = resp.status();
    if !status.is_success() {
        let error_body = resp
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        return Err(ColloquyError::ProviderUnavailable(format!(
            "{api_name} API error {status}: {error_body}"
        )));
    }
    Ok(resp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript() -> Vec<DialogMessage> {
        vec![
            DialogMessage::model(Provider::OpenAi, "Optimist", "Bright future."),
            DialogMessage::model(Provider::Anthropic, "Skeptic", "Doubtful."),
            DialogMessage::moderator(Provider::OpenAi, "Skeptic, explain."),
        ]
    }

    #[test]
    fn test_own_messages_are_assistant() {
        let mapped = map_transcript(&transcript(), Provider::OpenAi);
        let roles: Vec<_> = mapped.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec!["assistant", "user", "assistant"]);
    }

    #[test]
    fn test_other_speaker_view() {
        let mapped = map_transcript(&transcript(), Provider::Anthropic);
        let roles: Vec<_> = mapped.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec!["user", "assistant", "user"]);
    }

    #[test]
    fn test_contents_carry_labels() {
        let mapped = map_transcript(&transcript(), Provider::Anthropic);
        assert_eq!(mapped[0].content, "[Optimist]: Bright future.");
        assert_eq!(mapped[2].content, "[Moderator (User)]: Skeptic, explain.");
    }

    #[test]
    fn test_empty_transcript() {
        assert!(map_transcript(&[], Provider::OpenAi).is_empty());
    }
}
