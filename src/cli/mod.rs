//! CLI module for ralph - command-line interface and subcommands.
//!
//! Provides the main entry point with the build, plan, and task run modes.

pub mod commands;

pub use commands::Cli;
