//! Loop execution outcome types.
//!
//! This module defines the result of a whole run.

use std::time::Duration;

use thiserror::Error;

use super::iteration::IterationRecord;
use crate::gateway::GatewayError;
use crate::prompt::PromptError;

/// Why a run failed.
#[derive(Debug, Error)]
pub enum FailureCause {
    /// A send or session-lifecycle call failed
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The prompt could not be rebuilt for this iteration
    #[error(transparent)]
    Prompt(#[from] PromptError),

    /// The run was cancelled from outside
    #[error("Run cancelled")]
    Cancelled,

    /// The caller-supplied overall deadline passed
    #[error("Deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}

/// Terminal state of a run.
#[derive(Debug)]
pub enum LoopOutcome {
    /// The completion sentinel appeared in `response`
    Completed { response: String, iteration: u32 },
    /// The iteration budget ran out.
    ///
    /// A success when no sentinel was configured; when one was required and
    /// never observed, `sentinel_required` is true and the run did not succeed.
    Exhausted {
        last_response: Option<String>,
        sentinel_required: bool,
    },
    /// Aborted at `iteration`
    Failed { iteration: u32, cause: FailureCause },
}

impl LoopOutcome {
    pub fn is_success(&self) -> bool {
        match self {
            LoopOutcome::Completed { .. } => true,
            LoopOutcome::Exhausted { sentinel_required, .. } => !sentinel_required,
            LoopOutcome::Failed { .. } => false,
        }
    }

    /// Short lowercase label
    pub fn label(&self) -> &'static str {
        match self {
            LoopOutcome::Completed { .. } => "completed",
            LoopOutcome::Exhausted { .. } => "exhausted",
            LoopOutcome::Failed { .. } => "failed",
        }
    }
}

/// Everything a run produced: its outcome and the ordered iteration history.
#[derive(Debug)]
pub struct LoopResult {
    pub outcome: LoopOutcome,
    pub history: Vec<IterationRecord>,
}

impl LoopResult {
    pub fn new(outcome: LoopOutcome, history: Vec<IterationRecord>) -> Self {
        Self { outcome, history }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// Process exit status for this result
    pub fn exit_code(&self) -> u8 {
        if self.is_success() { 0 } else { 1 }
    }

    /// Number of iterations started
    pub fn iterations_run(&self) -> u32 {
        self.history.last().map(|r| r.index).unwrap_or(0)
    }

    /// Most recent response text, even from a run that later failed.
    ///
    /// Text streamed by a failed iteration counts.
    pub fn last_response(&self) -> Option<&str> {
        self.history.iter().rev().find_map(|r| r.produced_text())
    }
}
