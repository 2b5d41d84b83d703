use thiserror::Error;

/// A convenience `Result` alias using [`ColloquyError`].
pub type ColloquyResult<T> = Result<T, ColloquyError>;

/// Top-level error type for Colloquy.
///
/// Errors are always reported to the immediate caller or stream; nothing is
/// retried or swallowed inside the engine.
#[derive(Error, Debug)]
pub enum ColloquyError {
    /// An operation referenced a session id the registry does not know.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// A moderator intervention arrived after the dialog completed.
    #[error("Dialog has already ended")]
    DialogAlreadyFinished,

    /// A provider could not serve a turn (missing credential, transport
    /// failure or a non-success response).
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// A dialog configuration violated its bounds.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ColloquyError::SessionNotFound("abc123".into()).to_string(),
            "Session not found: abc123"
        );
        assert_eq!(
            ColloquyError::DialogAlreadyFinished.to_string(),
            "Dialog has already ended"
        );
        assert_eq!(
            ColloquyError::ProviderUnavailable("OPENAI_API_KEY is not set".into()).to_string(),
            "Provider unavailable: OPENAI_API_KEY is not set"
        );
    }

    #[test]
    fn test_json_error_conversion() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let converted: ColloquyError = err.into();
        assert!(matches!(converted, ColloquyError::Json(_)));
    }
}
