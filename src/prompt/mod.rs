//! Prompt System - prompt sources and per-iteration composition
//!
//! This module provides functionality for loading the initial prompt (inline
//! text or a file) and building the exact prompt sent on each iteration.

mod composer;
mod source;

pub use composer::{CONTEXT_END, CONTEXT_START, CONTINUE_INSTRUCTION, ContextMode, PromptComposer};
pub use source::{PromptError, PromptSource};
