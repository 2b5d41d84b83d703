use serde::{Deserialize, Serialize};

/// Events emitted while a provider streams one turn.
///
/// Backends push these into a bounded channel as the HTTP body arrives, so the
/// dialog engine can forward tokens before the response is complete.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A chunk of generated text.
    TextDelta {
        text: String,
    },

    /// The provider signalled the end of its response.
    Done,

    /// The body could not be read to completion.
    Error {
        message: String,
    },
}

/// Final outcome of a streamed turn, resolved by the backend's reader task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    /// All text deltas concatenated.
    pub text: String,
    /// Provider stop reason (`stop`, `end_turn`, `max_tokens`, ...).
    pub stop_reason: String,
}

/// Splits buffered server-sent-event bytes into complete `data:` payloads.
///
/// Bytes are kept raw until a full line arrives, so a multi-byte character
/// split across two network chunks is decoded intact. Comment lines and
/// non-data fields (`event:`, `id:`) are dropped.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    buffer: Vec<u8>,
}

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw chunk and return every complete data payload it finished.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(line_end) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=line_end).collect();
            let line = String::from_utf8_lossy(&raw[..line_end]);
            let line = line.trim();

            if line.is_empty() || line.starts_with(':') {
                continue;
            }
            if let Some(data) = line.strip_prefix("data:") {
                payloads.push(data.trim_start().to_string());
            }
        }
        payloads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_lines_only() {
        let mut buf = SseLineBuffer::new();
        let first = buf.push(b"data: {\"a\":1}\n\ndata: {\"b\"");
        assert_eq!(first, vec!["{\"a\":1}".to_string()]);

        let second = buf.push(b":2}\n\n");
        assert_eq!(second, vec!["{\"b\":2}".to_string()]);
    }

    #[test]
    fn test_skips_comments_and_event_lines() {
        let mut buf = SseLineBuffer::new();
        let payloads = buf.push(
            b": keep-alive\nevent: content_block_delta\ndata: {\"x\":true}\n\ndata: [DONE]\n",
        );
        assert_eq!(
            payloads,
            vec!["{\"x\":true}".to_string(), "[DONE]".to_string()]
        );
    }

    #[test]
    fn test_crlf_lines() {
        let mut buf = SseLineBuffer::new();
        let payloads = buf.push(b"data: hello\r\n\r\n");
        assert_eq!(payloads, vec!["hello".to_string()]);
    }

    #[test]
    fn test_multibyte_char_split_across_chunks() {
        let line = "data: Grüße\n".as_bytes();
        // Split inside the two-byte 'ü'.
        let split = line.iter().position(|&b| b == 0xC3).unwrap_or_default() + 1;

        let mut buf = SseLineBuffer::new();
        assert!(buf.push(&line[..split]).is_empty());
        assert_eq!(buf.push(&line[split..]), vec!["Grüße".to_string()]);
    }

    #[test]
    fn test_stream_event_tagging() {
        let json = serde_json::to_string(&StreamEvent::TextDelta {
            text: "hi".to_string(),
        })
        .unwrap_or_default();
        assert_eq!(json, r#"{"type":"text_delta","text":"hi"}"#);
    }
}
