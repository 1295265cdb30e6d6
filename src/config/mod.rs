//! Configuration system for ralph.
//!
//! Three-layer configuration hierarchy:
//! 1. Global config (~/.config/ralph/ralph.yml or .ralph.yml)
//! 2. Run mode (plan, build, or an inline task)
//! 3. Execution overrides (command line)

use eyre::Result;
use std::path::PathBuf;

pub use self::global::{AgentConfig, GlobalConfig, PromptsConfig, RunConfig};
pub use self::loop_config::{DEFAULT_MAX_ITERATIONS, LoopConfig};
pub use self::overrides::ConfigOverrides;
pub use self::resolution::{ResolvedRun, RunMode, resolve};

mod global;
mod loop_config;
mod overrides;
mod resolution;

/// Default model.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Default completion sentinel for inline task runs.
pub const DEFAULT_SENTINEL: &str = "COMPLETE";

/// Load configuration from the standard search paths.
///
/// Search order:
/// 1. Explicit path if provided
/// 2. .ralph.yml in current directory (project config)
/// 3. ~/.config/ralph/ralph.yml (user config)
/// 4. Default values
pub fn load_config(explicit_path: Option<&PathBuf>) -> Result<GlobalConfig> {
    GlobalConfig::load(explicit_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_default() {
        // Should succeed with defaults when no config file exists
        let config = load_config(None).unwrap();
        assert!(config.validate().is_ok());
    }
}
