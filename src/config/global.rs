//! Global configuration.
//!
//! Loaded from ~/.config/ralph/ralph.yml or .ralph.yml

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::gateway::{AnthropicConfig, PermissionPolicy};

/// Global configuration for ralph.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Agent session settings.
    pub agent: AgentConfig,

    /// Iteration budget and completion settings.
    #[serde(rename = "loop")]
    pub run: RunConfig,

    /// Conventional prompt file locations.
    pub prompts: PromptsConfig,
}

impl GlobalConfig {
    /// Load configuration with fallback chain.
    ///
    /// Search order:
    /// 1. Explicit path if provided
    /// 2. .ralph.yml in current directory
    /// 3. ~/.config/ralph/ralph.yml
    /// 4. Defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // Explicit path takes precedence
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let project_config = PathBuf::from(".ralph.yml");
        if project_config.exists() {
            match Self::load_from_file(&project_config) {
                Ok(config) => {
                    log::info!("Loaded config from .ralph.yml");
                    return Ok(config);
                }
                Err(e) => {
                    log::warn!("Failed to load .ralph.yml: {}", e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("ralph").join("ralph.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", user_config.display());
                        return Ok(config);
                    }
                    Err(e) => {
                        log::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.agent.model.is_empty() {
            eyre::bail!("agent.model cannot be empty");
        }
        if self.agent.timeout_ms == 0 {
            eyre::bail!("agent.timeout-ms must be > 0");
        }
        if self.run.max_iterations == 0 {
            eyre::bail!("loop.max-iterations must be > 0");
        }
        if self.run.task_max_iterations == 0 {
            eyre::bail!("loop.task-max-iterations must be > 0");
        }
        Ok(())
    }
}

/// Agent session settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Model used for every session.
    pub model: String,

    /// Directory sessions are pinned to (defaults to the current directory).
    #[serde(rename = "working-directory")]
    pub working_directory: Option<PathBuf>,

    /// Tool permission policy.
    #[serde(rename = "permission-policy")]
    pub permission_policy: PermissionPolicy,

    /// Base URL for the API.
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Environment variable holding the API key.
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    #[serde(rename = "api-version")]
    pub api_version: String,

    /// Maximum tokens per response.
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Timeout per agent call in milliseconds.
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        let anthropic = AnthropicConfig::default();
        Self {
            model: crate::config::DEFAULT_MODEL.to_string(),
            working_directory: None,
            permission_policy: PermissionPolicy::ApproveAll,
            base_url: anthropic.base_url,
            api_key_env: anthropic.api_key_env,
            api_version: anthropic.api_version,
            max_tokens: anthropic.max_tokens,
            timeout_ms: 300_000, // 5 minutes
        }
    }
}

impl AgentConfig {
    /// Gateway configuration derived from these settings.
    pub fn anthropic(&self) -> AnthropicConfig {
        AnthropicConfig {
            base_url: self.base_url.clone(),
            api_key_env: self.api_key_env.clone(),
            api_version: self.api_version.clone(),
            max_tokens: self.max_tokens,
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

/// Iteration budget and completion settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RunConfig {
    /// Iterations for plan/build runs.
    #[serde(rename = "max-iterations")]
    pub max_iterations: u32,

    /// Iterations for inline task runs.
    #[serde(rename = "task-max-iterations")]
    pub task_max_iterations: u32,

    /// Sentinel for inline task runs; empty disables detection.
    #[serde(rename = "completion-sentinel")]
    pub completion_sentinel: String,

    /// Overall deadline for a run, in seconds.
    #[serde(rename = "deadline-secs")]
    pub deadline_secs: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            task_max_iterations: 10,
            completion_sentinel: crate::config::DEFAULT_SENTINEL.to_string(),
            deadline_secs: None,
        }
    }
}

/// Conventional prompt file locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PromptsConfig {
    #[serde(rename = "build-file")]
    pub build_file: PathBuf,

    #[serde(rename = "plan-file")]
    pub plan_file: PathBuf,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            build_file: PathBuf::from("PROMPT_build.md"),
            plan_file: PathBuf::from("PROMPT_plan.md"),
        }
    }
}
