use colloquy_core::Provider;
use serde::{Deserialize, Serialize};

/// Notifications produced by the turn loop, in emission order.
///
/// Serialized with a `type` discriminator; the gateway also uses it as the
/// SSE event name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    /// A participant starts speaking.
    TurnStart {
        turn: u32,
        provider: Provider,
        role_label: String,
    },

    /// One streamed text fragment of the current turn.
    Token {
        turn: u32,
        provider: Provider,
        role_label: String,
        token: String,
    },

    /// The turn completed and was appended to the transcript.
    TurnEnd {
        turn: u32,
        provider: Provider,
        role_label: String,
        content: String,
        finished: bool,
    },

    /// No turns remain.
    DialogEnd {
        total_turns: u32,
    },
}

impl TurnEvent {
    /// The `type` discriminator.
    pub fn kind(&self) -> &'static str {
        match self {
            TurnEvent::TurnStart { .. } => "turn_start",
            TurnEvent::Token { .. } => "token",
            TurnEvent::TurnEnd { .. } => "turn_end",
            TurnEvent::DialogEnd { .. } => "dialog_end",
        }
    }
}
