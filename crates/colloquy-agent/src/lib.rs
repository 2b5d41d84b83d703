//! Streaming provider backends for Colloquy participants.
//!
//! A backend turns a system prompt and the dialog transcript into a lazy
//! sequence of text fragments. [`LlmClient`] selects the backend by the
//! speaking participant's [`Provider`](colloquy_core::Provider).

pub mod backends;
pub mod config;
pub mod llm;
pub mod stream;

pub use backends::{map_transcript, TokenBackend, TokenStream, TurnRequest, WireMessage};
pub use config::{ModelConfig, ProvidersConfig};
pub use llm::LlmClient;
pub use stream::{Completion, StreamEvent};
