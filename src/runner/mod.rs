//! Loop runner module - drives the Ralph iteration pattern.
//!
//! This module provides the core loop execution logic:
//! - IterationController for running one loop to a terminal state
//! - Cancellation and deadline handling around each send

mod controller;

pub use controller::IterationController;
