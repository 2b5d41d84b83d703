use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role label attached to moderator-injected messages.
pub const MODERATOR_LABEL: &str = "Moderator (User)";

/// The model providers a participant can be backed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI chat completions.
    OpenAi,
    /// Anthropic messages API.
    Anthropic,
}

impl Provider {
    /// Wire name of the provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
        }
    }

    /// Role label used when a participant does not set one.
    pub fn default_label(&self) -> &'static str {
        match self {
            Provider::OpenAi => "GPT",
            Provider::Anthropic => "Claude",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "anthropic" => Ok(Provider::Anthropic),
            other => Err(format!("unknown provider '{other}' (expected openai or anthropic)")),
        }
    }
}

/// A single contribution to a dialog transcript.
///
/// Either the output of one model turn or a moderator intervention. The
/// `provider` decides how the message is mapped into a backend's role
/// convention: it reads as the speaker's own output when the providers match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogMessage {
    /// Provider the message is attributed to.
    pub provider: Provider,
    /// Display label of the author, e.g. "Optimist".
    pub role_label: String,
    /// The textual content of the message.
    pub content: String,
    /// Whether the message was injected by the moderator.
    #[serde(default)]
    pub is_moderator: bool,
    /// UTC timestamp of when the message was appended.
    pub timestamp: DateTime<Utc>,
}

impl DialogMessage {
    /// Creates a message produced by a model turn.
    pub fn model(
        provider: Provider,
        role_label: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            role_label: role_label.into(),
            content: content.into(),
            is_moderator: false,
            timestamp: Utc::now(),
        }
    }

    /// Creates a moderator message attributed to `provider`'s context.
    pub fn moderator(provider: Provider, content: impl Into<String>) -> Self {
        Self {
            provider,
            role_label: MODERATOR_LABEL.to_string(),
            content: content.into(),
            is_moderator: true,
            timestamp: Utc::now(),
        }
    }

    /// Content prefixed with the author label, as sent to providers.
    pub fn attributed_content(&self) -> String {
        format!("[{}]: {}", self.role_label, self.content)
    }
}
