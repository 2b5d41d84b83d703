use crate::config::{DialogConfig, Participant};
use colloquy_core::DialogMessage;
use serde::{Deserialize, Serialize};

/// Configuration, transcript and turn counter of one dialog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogState {
    pub config: DialogConfig,
    /// Append-only transcript.
    #[serde(default)]
    pub messages: Vec<DialogMessage>,
    /// Completed model turns plus any turns skipped by an intervention.
    #[serde(default)]
    pub current_turn: u32,
}

impl DialogState {
    pub fn new(config: DialogConfig) -> Self {
        Self {
            config,
            messages: Vec::new(),
            current_turn: 0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.current_turn >= self.config.max_turns
    }

    /// Participant whose turn index is `current_turn`.
    pub fn current_participant(&self) -> &Participant {
        self.config.participant(self.current_turn as usize)
    }
}

/// Point-in-time view returned by the state query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogSnapshot {
    #[serde(flatten)]
    pub state: DialogState,
    pub finished: bool,
    pub paused: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use colloquy_core::Provider;

    fn state(max_turns: u32) -> DialogState {
        let mut config = DialogConfig::new(
            "Topic",
            Participant::new(Provider::OpenAi).with_label("A"),
            Participant::new(Provider::Anthropic).with_label("B"),
        );
        config.max_turns = max_turns;
        DialogState::new(config)
    }

    #[test]
    fn test_finished_iff_turns_reached() {
        let mut s = state(2);
        assert!(!s.is_finished());
        s.current_turn = 1;
        assert!(!s.is_finished());
        s.current_turn = 2;
        assert!(s.is_finished());
    }

    #[test]
    fn test_current_participant_alternates() {
        let mut s = state(4);
        assert_eq!(s.current_participant().role_label, "A");
        s.current_turn = 1;
        assert_eq!(s.current_participant().role_label, "B");
        s.current_turn = 2;
        assert_eq!(s.current_participant().role_label, "A");
    }

    #[test]
    fn test_snapshot_is_flat() {
        let snapshot = DialogSnapshot {
            state: state(2),
            finished: false,
            paused: true,
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["current_turn"], 0);
        assert_eq!(json["paused"], true);
        assert_eq!(json["config"]["topic"], "Topic");
        assert!(json["messages"].as_array().unwrap().is_empty());
    }
}
