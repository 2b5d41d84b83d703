//! Core types and error definitions for Colloquy.
//!
//! This crate provides the foundational types shared across all Colloquy crates:
//! the unified error type and the provider-agnostic transcript model.
//!
//! # Main types
//!
//! - [`ColloquyError`]: Unified error enum for all Colloquy subsystems.
//! - [`ColloquyResult`]: Convenience alias for `Result<T, ColloquyError>`.
//! - [`Provider`]: The closed set of model providers a participant can use.
//! - [`DialogMessage`]: One contribution to a dialog transcript.

/// Error types.
pub mod error;
/// Transcript message types.
pub mod message;

pub use error::{ColloquyError, ColloquyResult};
pub use message::{DialogMessage, Provider, MODERATOR_LABEL};
