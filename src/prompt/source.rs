//! Prompt sources - where the initial prompt text comes from

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors reading a prompt
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Failed to read prompt file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Prompt file {0} is empty")]
    Empty(PathBuf),

    #[error("Prompt text is empty")]
    EmptyText,
}

/// Where the initial prompt comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptSource {
    /// Prompt text given inline
    Static(String),
    /// Prompt read from a file
    File(PathBuf),
}

impl PromptSource {
    /// Read the prompt text.
    ///
    /// Called once before the loop starts; a failure here is a configuration
    /// error. Blank prompts are rejected.
    pub fn load(&self) -> Result<String, PromptError> {
        match self {
            PromptSource::Static(text) => {
                if text.trim().is_empty() {
                    return Err(PromptError::EmptyText);
                }
                Ok(text.clone())
            }
            PromptSource::File(path) => {
                let text = read_prompt_file(path)?;
                if text.trim().is_empty() {
                    return Err(PromptError::Empty(path.clone()));
                }
                Ok(text)
            }
        }
    }

    /// Path of a file-backed source
    pub fn path(&self) -> Option<&Path> {
        match self {
            PromptSource::Static(_) => None,
            PromptSource::File(path) => Some(path),
        }
    }
}

impl fmt::Display for PromptSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptSource::Static(text) => write!(f, "inline ({} chars)", text.chars().count()),
            PromptSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

pub(crate) fn read_prompt_file(path: &Path) -> Result<String, PromptError> {
    std::fs::read_to_string(path).map_err(|source| PromptError::Read {
        path: path.to_path_buf(),
        source,
    })
}
