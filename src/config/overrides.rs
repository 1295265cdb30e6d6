//! Execution overrides.
//!
//! Command-line values layered over the global config for one run.

use std::path::PathBuf;

use crate::session::SessionStrategy;

/// Configuration overrides for a single run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Override maximum iterations.
    pub max_iterations: Option<u32>,

    /// Override the completion sentinel; `Some("")` disables detection.
    pub sentinel: Option<String>,

    /// Read the prompt from this file instead of the mode's default.
    pub prompt_file: Option<PathBuf>,

    /// Override the mode's session strategy.
    pub session_strategy: Option<SessionStrategy>,

    /// Override the model.
    pub model: Option<String>,

    /// Override the overall deadline, in seconds.
    pub deadline_secs: Option<u64>,
}

impl ConfigOverrides {
    /// Create empty overrides (no overrides applied).
    pub fn none() -> Self {
        Self::default()
    }

    /// Check if any overrides are set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Create overrides with just max_iterations.
    pub fn with_max_iterations(max_iterations: u32) -> Self {
        Self {
            max_iterations: Some(max_iterations),
            ..Default::default()
        }
    }
}
