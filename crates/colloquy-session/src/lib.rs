//! Dialog sessions: configuration, the turn-loop engine and the registry.
//!
//! A [`DialogEngine`] alternates turns between two participants, streams each
//! turn's tokens as [`TurnEvent`]s, and accepts pause/resume and moderator
//! interventions while the loop runs. The [`SessionRegistry`] maps opaque
//! session ids to engines.

pub mod config;
pub mod engine;
pub mod event;
pub mod gate;
pub mod prompt;
pub mod registry;
pub mod state;

pub use config::{DialogConfig, Participant};
pub use engine::{DialogEngine, EngineOptions, EventStream};
pub use event::TurnEvent;
pub use gate::PauseGate;
pub use prompt::build_system_prompt;
pub use registry::SessionRegistry;
pub use state::{DialogSnapshot, DialogState};
