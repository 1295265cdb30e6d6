//! Per-iteration prompt composition.

use serde::{Deserialize, Serialize};

use super::source::{PromptError, PromptSource, read_prompt_file};

/// Opening delimiter of the carried-over response
pub const CONTEXT_START: &str = "=== CONTEXT FROM PREVIOUS ITERATION ===";

/// Closing delimiter of the carried-over response
pub const CONTEXT_END: &str = "=== END CONTEXT ===";

/// Instruction appended after the carried-over response
pub const CONTINUE_INSTRUCTION: &str =
    "Continue working on this task. Review the previous attempt and improve upon it.";

/// How continuity between iterations is achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContextMode {
    /// Re-inject the previous response into the next prompt
    CarryPreviousResponse,
    /// Same prompt every time; the agent keeps state in files it reads and writes
    SharedFilesystemState,
}

/// Builds the prompt for each iteration.
///
/// The initial prompt is taken as already loaded: a file-backed source is read
/// once before the run, and in carry-over mode never again.
#[derive(Debug, Clone)]
pub struct PromptComposer {
    initial_prompt: String,
    source: PromptSource,
    mode: ContextMode,
}

impl PromptComposer {
    pub fn new(initial_prompt: impl Into<String>, source: PromptSource, mode: ContextMode) -> Self {
        Self {
            initial_prompt: initial_prompt.into(),
            source,
            mode,
        }
    }

    pub fn initial_prompt(&self) -> &str {
        &self.initial_prompt
    }

    pub fn mode(&self) -> ContextMode {
        self.mode
    }

    /// Prompt text for a 1-based iteration.
    pub fn compose(&self, iteration: u32, prior_response: Option<&str>) -> Result<String, PromptError> {
        if iteration <= 1 {
            return Ok(self.initial_prompt.clone());
        }

        match self.mode {
            ContextMode::CarryPreviousResponse => Ok(match prior_response {
                Some(previous) => carry_over(&self.initial_prompt, previous),
                None => self.initial_prompt.clone(),
            }),
            ContextMode::SharedFilesystemState => match &self.source {
                // The agent may rewrite files it also reads, the prompt included
                PromptSource::File(path) => read_prompt_file(path),
                PromptSource::Static(_) => Ok(self.initial_prompt.clone()),
            },
        }
    }
}

fn carry_over(initial_prompt: &str, previous: &str) -> String {
    format!(
        "{}\n\n{}\n{}\n{}\n\n{}",
        initial_prompt, CONTEXT_START, previous, CONTEXT_END, CONTINUE_INSTRUCTION
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn carry(prompt: &str) -> PromptComposer {
        PromptComposer::new(
            prompt,
            PromptSource::Static(prompt.to_string()),
            ContextMode::CarryPreviousResponse,
        )
    }

    #[test]
    fn test_first_iteration_is_verbatim() {
        let composer = carry("Build a validator.\n");
        assert_eq!(composer.compose(1, None).unwrap(), "Build a validator.\n");
        assert_eq!(composer.compose(1, Some("ignored")).unwrap(), "Build a validator.\n");
    }

    #[test]
    fn test_carry_over_layout() {
        let composer = carry("Task");
        let prompt = composer.compose(2, Some("Attempt one")).unwrap();

        assert_eq!(
            prompt,
            "Task\n\n=== CONTEXT FROM PREVIOUS ITERATION ===\nAttempt one\n=== END CONTEXT ===\n\n\
             Continue working on this task. Review the previous attempt and improve upon it."
        );
    }

    #[test]
    fn test_carry_over_is_untruncated() {
        let composer = carry("Task");
        let previous = "x".repeat(100_000) + "TAIL";
        let prompt = composer.compose(5, Some(&previous)).unwrap();

        assert!(prompt.starts_with("Task\n\n"));
        assert!(prompt.contains(&previous));
        assert!(prompt.contains("TAIL\n=== END CONTEXT ==="));
    }

    #[test]
    fn test_carry_over_file_not_reread() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("PROMPT.md");
        std::fs::write(&path, "original").unwrap();

        let source = PromptSource::File(path.clone());
        let composer = PromptComposer::new(source.load().unwrap(), source, ContextMode::CarryPreviousResponse);
        std::fs::write(&path, "rewritten").unwrap();

        let prompt = composer.compose(2, Some("prev")).unwrap();
        assert!(prompt.starts_with("original"));
        assert!(!prompt.contains("rewritten"));
    }

    #[test]
    fn test_shared_state_rereads_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("PROMPT_build.md");
        std::fs::write(&path, "v1").unwrap();

        let source = PromptSource::File(path.clone());
        let composer = PromptComposer::new(source.load().unwrap(), source, ContextMode::SharedFilesystemState);

        assert_eq!(composer.compose(1, None).unwrap(), "v1");
        std::fs::write(&path, "v2").unwrap();
        assert_eq!(composer.compose(2, Some("agent output")).unwrap(), "v2");
    }

    #[test]
    fn test_shared_state_ignores_prior_response() {
        let composer = PromptComposer::new(
            "Same every time",
            PromptSource::Static("Same every time".into()),
            ContextMode::SharedFilesystemState,
        );
        let prompt = composer.compose(3, Some("previous output")).unwrap();
        assert_eq!(prompt, "Same every time");
        assert!(!prompt.contains(CONTEXT_START));
    }

    #[test]
    fn test_shared_state_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("PROMPT_build.md");
        std::fs::write(&path, "v1").unwrap();

        let source = PromptSource::File(path.clone());
        let composer = PromptComposer::new("v1", source, ContextMode::SharedFilesystemState);
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(composer.compose(2, None), Err(PromptError::Read { .. })));
    }

    #[test]
    fn test_context_mode_serialization() {
        let json = serde_json::to_string(&ContextMode::CarryPreviousResponse).unwrap();
        assert_eq!(json, "\"carry-previous-response\"");
    }
}
