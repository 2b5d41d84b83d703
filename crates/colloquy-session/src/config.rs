use colloquy_core::{ColloquyError, ColloquyResult, Provider};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Inclusive bounds for `max_turns`.
pub const MAX_TURNS_RANGE: std::ops::RangeInclusive<u32> = 2..=50;
/// Inclusive bounds for `token_delay_ms`.
pub const TOKEN_DELAY_RANGE: std::ops::RangeInclusive<u64> = 0..=500;

/// One side of the dialog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub provider: Provider,
    /// Perspective such as "Optimist". Empty means the provider's default label.
    #[serde(default)]
    pub role_label: String,
    /// Persona addendum on the way in; replaced by the full instruction text
    /// once the engine is constructed.
    #[serde(default)]
    pub system_prompt: String,
}

impl Participant {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            role_label: String::new(),
            system_prompt: String::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.role_label = label.into();
        self
    }

    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.system_prompt = persona.into();
        self
    }
}

/// Configuration set by the client when a dialog starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogConfig {
    pub topic: String,
    pub participant_a: Participant,
    pub participant_b: Participant,
    /// Total number of model turns across both participants.
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
    /// Pause after each forwarded token, to pace output at reading speed.
    #[serde(default = "default_token_delay_ms")]
    pub token_delay_ms: u64,
    #[serde(default)]
    pub rules: String,
}

fn default_max_turns() -> u32 {
    6
}

fn default_token_delay_ms() -> u64 {
    80
}

impl DialogConfig {
    pub fn new(topic: impl Into<String>, participant_a: Participant, participant_b: Participant) -> Self {
        Self {
            topic: topic.into(),
            participant_a,
            participant_b,
            max_turns: default_max_turns(),
            token_delay_ms: default_token_delay_ms(),
            rules: String::new(),
        }
    }

    /// Check the bounds a start request must satisfy.
    pub fn validate(&self) -> ColloquyResult<()> {
        if self.topic.trim().is_empty() {
            return Err(ColloquyError::InvalidConfig("topic must not be empty".into()));
        }
        if !MAX_TURNS_RANGE.contains(&self.max_turns) {
            return Err(ColloquyError::InvalidConfig(format!(
                "max_turns must be between {} and {}, got {}",
                MAX_TURNS_RANGE.start(),
                MAX_TURNS_RANGE.end(),
                self.max_turns
            )));
        }
        if !TOKEN_DELAY_RANGE.contains(&self.token_delay_ms) {
            return Err(ColloquyError::InvalidConfig(format!(
                "token_delay_ms must be between {} and {}, got {}",
                TOKEN_DELAY_RANGE.start(),
                TOKEN_DELAY_RANGE.end(),
                self.token_delay_ms
            )));
        }
        Ok(())
    }

    pub fn token_delay(&self) -> Duration {
        Duration::from_millis(self.token_delay_ms)
    }

    /// Participant by parity slot: 0 is A, 1 is B.
    pub fn participant(&self, slot: usize) -> &Participant {
        if slot % 2 == 0 {
            &self.participant_a
        } else {
            &self.participant_b
        }
    }
}
