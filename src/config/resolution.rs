//! Configuration resolution.
//!
//! Resolves the effective run settings from:
//! 1. GlobalConfig (defaults)
//! 2. RunMode (plan / build / inline task)
//! 3. ConfigOverrides (command line)

use std::fmt;
use std::path::Path;
use std::time::Duration;

use super::{ConfigOverrides, GlobalConfig, LoopConfig};
use crate::gateway::{AnthropicConfig, SessionOptions};
use crate::prompt::{ContextMode, PromptSource};

/// What kind of run to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Work through the plan with the build prompt file
    Build,
    /// Generate or update the plan with the plan prompt file
    Plan,
    /// Iterate on an inline prompt until the sentinel appears
    Task { prompt: String },
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Build => f.write_str("build"),
            RunMode::Plan => f.write_str("plan"),
            RunMode::Task { .. } => f.write_str("task"),
        }
    }
}

/// Everything needed to start a run.
#[derive(Debug, Clone)]
pub struct ResolvedRun {
    pub mode: RunMode,
    pub loop_config: LoopConfig,
    pub session: SessionOptions,
    pub gateway: AnthropicConfig,
}

/// Resolve the effective configuration for a run.
///
/// `cwd` is the directory sessions are pinned to when the config names none;
/// relative prompt paths are resolved against it.
pub fn resolve(
    global: &GlobalConfig,
    mode: &RunMode,
    overrides: &ConfigOverrides,
    cwd: &Path,
) -> eyre::Result<ResolvedRun> {
    let mut loop_config = match mode {
        RunMode::Build | RunMode::Plan => {
            let default_file = if *mode == RunMode::Plan {
                &global.prompts.plan_file
            } else {
                &global.prompts.build_file
            };
            let file = overrides.prompt_file.as_ref().unwrap_or(default_file);
            LoopConfig::new(PromptSource::File(cwd.join(file)), ContextMode::SharedFilesystemState)
                .with_max_iterations(global.run.max_iterations)
        }
        RunMode::Task { prompt } => {
            let source = match &overrides.prompt_file {
                Some(file) => PromptSource::File(cwd.join(file)),
                None => PromptSource::Static(prompt.clone()),
            };
            LoopConfig::new(source, ContextMode::CarryPreviousResponse)
                .with_max_iterations(global.run.task_max_iterations)
                .with_sentinel(global.run.completion_sentinel.clone())
        }
    };

    if let Some(max_iterations) = overrides.max_iterations {
        loop_config = loop_config.with_max_iterations(max_iterations);
    }
    if let Some(sentinel) = &overrides.sentinel {
        loop_config = loop_config.with_sentinel(sentinel.clone());
    }
    if let Some(strategy) = overrides.session_strategy {
        loop_config = loop_config.with_session_strategy(strategy);
    }
    if let Some(secs) = overrides.deadline_secs.or(global.run.deadline_secs) {
        loop_config = loop_config.with_deadline(Duration::from_secs(secs));
    }

    loop_config.validate()?;

    let model = overrides.model.clone().unwrap_or_else(|| global.agent.model.clone());
    if model.is_empty() {
        eyre::bail!("model cannot be empty");
    }
    let working_directory = global
        .agent
        .working_directory
        .clone()
        .unwrap_or_else(|| cwd.to_path_buf());
    let session = SessionOptions::new(model)
        .with_working_directory(working_directory)
        .with_permission_policy(global.agent.permission_policy);

    Ok(ResolvedRun {
        mode: mode.clone(),
        loop_config,
        session,
        gateway: global.agent.anthropic(),
    })
}
