//! Error types for ralph-loop
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

use crate::prompt::PromptError;

/// Errors surfaced at the library's seams.
///
/// Loop-level failures (gateway errors during an iteration, cancellation) are
/// not errors: they become `LoopOutcome::Failed` inside the `LoopResult`.
#[derive(Debug, Error)]
pub enum RalphError {
    /// Missing or invalid configuration, fatal before the loop starts
    #[error("Config error: {0}")]
    Config(String),

    /// Prompt source could not be read
    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),
}

/// Result type alias for ralph-loop operations
pub type Result<T> = std::result::Result<T, RalphError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_config_error() {
        let err = RalphError::Config("max-iterations must be > 0".to_string());
        assert_eq!(err.to_string(), "Config error: max-iterations must be > 0");
    }

    #[test]
    fn test_prompt_error_conversion() {
        let prompt_err = PromptError::Empty(PathBuf::from("PROMPT_build.md"));
        let err: RalphError = prompt_err.into();
        assert!(matches!(err, RalphError::Prompt(_)));
        assert!(err.to_string().contains("PROMPT_build.md"));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(RalphError::Config("test".to_string()))
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }
}
