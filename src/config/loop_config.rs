//! Effective loop configuration (resolved from all layers).
//!
//! This is the final, immutable configuration applied to a run.

use std::time::Duration;

use crate::error::{RalphError, Result};
use crate::prompt::{ContextMode, PromptSource};
use crate::session::SessionStrategy;

/// Default iteration budget for a loop built in code.
pub const DEFAULT_MAX_ITERATIONS: u32 = 10;

/// Effective configuration for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopConfig {
    /// Maximum iterations before giving up (> 0).
    pub max_iterations: u32,

    /// Marker whose presence in a response ends the run.
    /// `None` means run exactly `max_iterations`.
    pub completion_sentinel: Option<String>,

    /// Where the initial prompt comes from.
    pub prompt_source: PromptSource,

    /// How continuity between iterations is achieved.
    pub context_mode: ContextMode,

    /// Fresh session per iteration, or one for the run.
    pub session_strategy: SessionStrategy,

    /// Overall deadline for the whole run.
    pub deadline: Option<Duration>,
}

impl LoopConfig {
    /// Create a config; carry-over runs default to a persistent session,
    /// shared-filesystem runs to fresh sessions.
    pub fn new(prompt_source: PromptSource, context_mode: ContextMode) -> Self {
        let session_strategy = match context_mode {
            ContextMode::CarryPreviousResponse => SessionStrategy::Persistent,
            ContextMode::SharedFilesystemState => SessionStrategy::FreshPerIteration,
        };

        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            completion_sentinel: None,
            prompt_source,
            context_mode,
            session_strategy,
            deadline: None,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the completion sentinel; an empty string disables detection.
    pub fn with_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        let sentinel = sentinel.into();
        self.completion_sentinel = if sentinel.is_empty() { None } else { Some(sentinel) };
        self
    }

    pub fn with_session_strategy(mut self, strategy: SessionStrategy) -> Self {
        self.session_strategy = strategy;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Configured sentinel, if detection is enabled
    pub fn sentinel(&self) -> Option<&str> {
        self.completion_sentinel.as_deref().filter(|s| !s.is_empty())
    }

    /// Read the initial prompt from the configured source.
    ///
    /// A failure here is a configuration error: it happens before the loop starts.
    pub fn load_prompt(&self) -> Result<String> {
        Ok(self.prompt_source.load()?)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(RalphError::Config("max_iterations must be > 0".to_string()));
        }
        if let PromptSource::File(path) = &self.prompt_source
            && path.as_os_str().is_empty()
        {
            return Err(RalphError::Config("prompt file path cannot be empty".to_string()));
        }
        if self.deadline == Some(Duration::ZERO) {
            return Err(RalphError::Config("deadline must be > 0".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn static_config() -> LoopConfig {
        LoopConfig::new(PromptSource::Static("task".into()), ContextMode::CarryPreviousResponse)
    }

    #[test]
    fn test_default_loop_config() {
        let config = static_config();
        assert_eq!(config.max_iterations, DEFAULT_MAX_ITERATIONS);
        assert!(config.sentinel().is_none());
        assert_eq!(config.session_strategy, SessionStrategy::Persistent);
        assert!(config.deadline.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_shared_state_defaults_to_fresh_sessions() {
        let config = LoopConfig::new(
            PromptSource::File(PathBuf::from("PROMPT_build.md")),
            ContextMode::SharedFilesystemState,
        );
        assert_eq!(config.session_strategy, SessionStrategy::FreshPerIteration);
    }

    #[test]
    fn test_with_sentinel() {
        let config = static_config().with_sentinel("COMPLETE");
        assert_eq!(config.sentinel(), Some("COMPLETE"));
    }

    #[test]
    fn test_empty_sentinel_disables_detection() {
        let config = static_config().with_sentinel("COMPLETE").with_sentinel("");
        assert!(config.completion_sentinel.is_none());
        assert!(config.sentinel().is_none());
    }

    #[test]
    fn test_invalid_zero_iterations() {
        let config = static_config().with_max_iterations(0);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, RalphError::Config(_)));
    }

    #[test]
    fn test_invalid_empty_prompt_path() {
        let config = LoopConfig::new(PromptSource::File(PathBuf::new()), ContextMode::SharedFilesystemState);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_prompt_static() {
        assert_eq!(static_config().load_prompt().unwrap(), "task");
    }

    #[test]
    fn test_load_prompt_missing_file_is_prompt_error() {
        let config = LoopConfig::new(
            PromptSource::File(PathBuf::from("/nonexistent/ralph/PROMPT_plan.md")),
            ContextMode::SharedFilesystemState,
        );
        let err = config.load_prompt().unwrap_err();
        assert!(matches!(err, RalphError::Prompt(_)));
        assert!(err.to_string().contains("PROMPT_plan.md"));
    }

    #[test]
    fn test_invalid_zero_deadline() {
        let config = static_config().with_deadline(Duration::ZERO);
        assert!(config.validate().is_err());
    }
}
