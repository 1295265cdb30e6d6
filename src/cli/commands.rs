//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - build: work through PROMPT_build.md (the default)
//! - plan: work through PROMPT_plan.md
//! - task: iterate on an inline prompt until it reports completion

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ralph_loop::config::{ConfigOverrides, RunMode};
use ralph_loop::session::SessionStrategy;

/// Ralph - run an agent in a loop until the job is done
#[derive(Parser, Debug)]
#[command(name = "ralph")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Maximum number of iterations
    #[arg(short = 'n', long, global = true, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_iterations: Option<u32>,

    /// Completion sentinel; an empty string disables detection
    #[arg(short, long, global = true)]
    pub sentinel: Option<String>,

    /// Read the prompt from this file
    #[arg(long, global = true)]
    pub prompt_file: Option<PathBuf>,

    /// Create a new agent session for every iteration
    #[arg(long, global = true, conflicts_with = "persistent_session")]
    pub fresh_sessions: bool,

    /// Keep one agent session for the whole run
    #[arg(long, global = true)]
    pub persistent_session: bool,

    /// Model to use
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Give up after this many seconds
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub deadline_secs: Option<u64>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Run mode selected on the command line; build when none is given.
    pub fn mode(&self) -> RunMode {
        match &self.command {
            None | Some(Commands::Build) => RunMode::Build,
            Some(Commands::Plan) => RunMode::Plan,
            Some(Commands::Task { prompt }) => RunMode::Task { prompt: prompt.clone() },
        }
    }

    /// Overrides to layer over the loaded config.
    pub fn overrides(&self) -> ConfigOverrides {
        let session_strategy = if self.fresh_sessions {
            Some(SessionStrategy::FreshPerIteration)
        } else if self.persistent_session {
            Some(SessionStrategy::Persistent)
        } else {
            None
        };

        ConfigOverrides {
            max_iterations: self.max_iterations,
            sentinel: self.sentinel.clone(),
            prompt_file: self.prompt_file.clone(),
            session_strategy,
            model: self.model.clone(),
            deadline_secs: self.deadline_secs,
        }
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Work through the build prompt (PROMPT_build.md)
    Build,

    /// Generate or refresh the plan (PROMPT_plan.md)
    Plan,

    /// Iterate on an inline task until the agent reports completion
    Task {
        /// Task description sent to the agent
        prompt: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_no_args() {
        // No args means build mode
        let cli = Cli::try_parse_from(["ralph"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
        assert!(cli.config.is_none());
        assert_eq!(cli.mode(), RunMode::Build);
        assert!(cli.overrides().is_empty());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["ralph", "-v"]).unwrap();
        assert!(cli.is_verbose());
    }

    #[test]
    fn test_cli_config_option() {
        let cli = Cli::try_parse_from(["ralph", "-c", "/path/to/ralph.yml"]).unwrap();
        assert_eq!(cli.config.as_ref(), Some(&PathBuf::from("/path/to/ralph.yml")));
    }

    #[test]
    fn test_plan_command() {
        let cli = Cli::try_parse_from(["ralph", "plan"]).unwrap();
        assert_eq!(cli.mode(), RunMode::Plan);
    }

    #[test]
    fn test_task_command() {
        let cli = Cli::try_parse_from(["ralph", "task", "Write a CSV parser", "-n", "5"]).unwrap();
        assert_eq!(
            cli.mode(),
            RunMode::Task {
                prompt: "Write a CSV parser".into()
            }
        );
        assert_eq!(cli.overrides().max_iterations, Some(5));
    }

    #[test]
    fn test_task_requires_prompt() {
        assert!(Cli::try_parse_from(["ralph", "task"]).is_err());
    }

    #[test]
    fn test_zero_iterations_rejected() {
        assert!(Cli::try_parse_from(["ralph", "-n", "0"]).is_err());
    }

    #[test]
    fn test_empty_sentinel_accepted() {
        let cli = Cli::try_parse_from(["ralph", "task", "t", "--sentinel", ""]).unwrap();
        assert_eq!(cli.overrides().sentinel, Some(String::new()));
    }

    #[test]
    fn test_session_flags() {
        let cli = Cli::try_parse_from(["ralph", "--fresh-sessions"]).unwrap();
        assert_eq!(cli.overrides().session_strategy, Some(SessionStrategy::FreshPerIteration));

        let cli = Cli::try_parse_from(["ralph", "build", "--persistent-session"]).unwrap();
        assert_eq!(cli.overrides().session_strategy, Some(SessionStrategy::Persistent));

        assert!(Cli::try_parse_from(["ralph", "--fresh-sessions", "--persistent-session"]).is_err());
    }

    #[test]
    fn test_all_overrides() {
        let cli = Cli::try_parse_from([
            "ralph",
            "build",
            "--prompt-file",
            "PROMPT_custom.md",
            "--model",
            "claude-haiku",
            "--deadline-secs",
            "600",
            "-s",
            "DONE",
        ])
        .unwrap();
        let overrides = cli.overrides();
        assert_eq!(overrides.prompt_file, Some(PathBuf::from("PROMPT_custom.md")));
        assert_eq!(overrides.model.as_deref(), Some("claude-haiku"));
        assert_eq!(overrides.deadline_secs, Some(600));
        assert_eq!(overrides.sentinel.as_deref(), Some("DONE"));
    }

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }
}
