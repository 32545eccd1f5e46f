use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::ConfigError;

pub const DEFAULT_AGENT_PROMPT: &str = "Read PROCESS.md and all the pages that it references";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Seconds to wait for the agent command to take over its pane before
    /// sending the initial prompt. Zero sends immediately.
    pub agent_ready: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { agent_ready: 5 }
    }
}

/// Settings read from the optional YAML config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base: PathBuf,
    pub wt_root: PathBuf,
    pub branch_prefix: String,
    pub email_domain: String,
    pub review_tool: String,
    pub agent_command: String,
    pub agent_prompt: String,
    pub timeouts: TimeoutConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base: PathBuf::from(".."),
            wt_root: PathBuf::from("../_wt"),
            branch_prefix: "aiagent".to_string(),
            email_domain: "local".to_string(),
            review_tool: "lazygit".to_string(),
            agent_command: "codex".to_string(),
            agent_prompt: DEFAULT_AGENT_PROMPT.to_string(),
            timeouts: TimeoutConfig::default(),
        }
    }
}

impl Config {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let path = config_path.unwrap_or_else(Self::default_config_path);

        if !path.exists() {
            tracing::debug!("No config file at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::InvalidConfigFile {
                path: path.clone(),
                message: e.to_string(),
            })?;
        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn default_config_path() -> PathBuf {
        if let Some(config_path) = std::env::var_os("AGENTWT_CONFIG") {
            PathBuf::from(config_path)
        } else {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("agentwt")
                .join("config.yaml")
        }
    }
}
