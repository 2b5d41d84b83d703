use crate::backends::claude::ClaudeBackend;
use crate::backends::openai::OpenAiBackend;
use crate::backends::{TokenBackend, TokenStream, TurnRequest};
use crate::config::ProvidersConfig;
use colloquy_core::{ColloquyResult, Provider};
use tracing::debug;

/// Provider client shared by every dialog in the process.
///
/// Holds one backend per [`Provider`] variant and dispatches on the tag of
/// the speaking participant. Backends share a single HTTP connection pool.
pub struct LlmClient {
    openai: OpenAiBackend,
    claude: ClaudeBackend,
}

impl LlmClient {
    pub fn new(config: ProvidersConfig) -> Self {
        let http = reqwest::Client::new();
        Self {
            openai: OpenAiBackend::new(config.openai, http.clone()),
            claude: ClaudeBackend::new(config.anthropic, http),
        }
    }

    fn backend(&self, provider: Provider) -> &dyn TokenBackend {
        match provider {
            Provider::OpenAi => &self.openai,
            Provider::Anthropic => &self.claude,
        }
    }

    /// Streaming completion for the speaker named in `request`.
    pub async fn stream_tokens(&self, request: TurnRequest<'_>) -> ColloquyResult<TokenStream> {
        debug!(
            provider = %request.speaker,
            history = request.transcript.len(),
            "Requesting token stream"
        );
        self.backend(request.speaker).stream_tokens(request).await
    }
}
