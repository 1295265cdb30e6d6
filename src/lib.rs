//! Ralph - an iterative agent task controller
//!
//! Ralph implements the "Ralph Wiggum" pattern for AI-assisted software development:
//! send the same task to an agent over and over, carrying context forward either
//! in the prompt or on disk, until the agent reports completion or the iteration
//! budget runs out.

pub mod completion;
pub mod config;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod id;
pub mod observe;
pub mod prompt;
pub mod report;
pub mod runner;
pub mod session;

pub use error::{RalphError, Result};
