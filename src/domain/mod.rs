//! Domain types - iteration records and run outcomes.

mod iteration;
mod outcome;

pub use iteration::{IterationRecord, PendingIteration, ToolEvent};
pub use outcome::{FailureCause, LoopOutcome, LoopResult};
